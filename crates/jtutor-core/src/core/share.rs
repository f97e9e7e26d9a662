//! Share links for code-lab programs.
//!
//! A program travels in the `code` query parameter as URL-safe base64 of its
//! UTF-8 bytes. Older links used standard base64 placed in the URL unescaped;
//! by the time a query parser hands those over, every `+` has become a space.
//! Both forms decode.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use url::Url;

/// Query parameter carrying the program.
pub const SHARE_PARAM: &str = "code";

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Encodes a program as a share token.
pub fn encode(code: &str) -> String {
    URL_SAFE_NO_PAD.encode(code.as_bytes())
}

/// Decodes a share token, accepting the URL-safe and legacy forms.
///
/// # Errors
/// Returns an error if the token is not base64 or not UTF-8.
pub fn decode(token: &str) -> Result<String> {
    // Spaces may stand for `+` in a legacy token, so only line breaks and
    // tabs are trimmed.
    let token = token.trim_matches(['\n', '\r', '\t']);
    if token.trim().is_empty() {
        bail!("Share token is empty");
    }

    let bytes = match URL_SAFE_LENIENT.decode(token) {
        Ok(bytes) => bytes,
        Err(_) => STANDARD_LENIENT
            .decode(token.replace(' ', "+"))
            .context("Share token is not valid base64")?,
    };
    String::from_utf8(bytes).context("Shared code is not valid UTF-8")
}

/// Builds a share link by placing the token in `base`'s query.
///
/// # Errors
/// Returns an error if `base` is not an absolute URL.
pub fn share_url(base: &str, code: &str) -> Result<String> {
    let mut url = Url::parse(base).with_context(|| format!("Invalid share base URL: {base}"))?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != SHARE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in &kept {
            query.append_pair(key, value);
        }
        query.append_pair(SHARE_PARAM, &encode(code));
    }
    Ok(url.to_string())
}

/// A share link split into its program and the link without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedLink {
    /// `None` when the link has no `code` parameter or it does not decode.
    pub code: Option<String>,
    pub clean_url: String,
}

/// Extracts the shared program from `link` and strips the parameter.
///
/// # Errors
/// Returns an error only if `link` is not a URL; bad tokens are logged and
/// ignored.
pub fn take_shared_code(link: &str) -> Result<SharedLink> {
    let mut url = Url::parse(link).with_context(|| format!("Invalid share link: {link}"))?;

    let mut token = None;
    let mut kept = Vec::new();
    for (key, value) in url.query_pairs() {
        if key == SHARE_PARAM {
            token.get_or_insert_with(|| value.into_owned());
        } else {
            kept.push((key.into_owned(), value.into_owned()));
        }
    }

    let code = token.and_then(|token| match decode(&token) {
        Ok(code) => Some(code),
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "ignoring undecodable shared code");
            None
        }
    });

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&kept);
    }

    Ok(SharedLink {
        code,
        clean_url: url.to_string(),
    })
}
