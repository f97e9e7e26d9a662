//! Model-backed commands against a mocked Gemini endpoint.


use assert_cmd::cargo::cargo_bin_cmd;
use fixtures::{
    GENERATE_PATH, QUIZ_PAYLOAD, STREAM_PATH, can_bind_localhost, generate_response,
    stream_response,
};
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-api-key";

fn jtutor(home: &TempDir, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("jtutor");
    cmd.env("JTUTOR_HOME", home.path())
        .env("GEMINI_API_KEY", API_KEY)
        .env("GEMINI_BASE_URL", server.uri());
    cmd
}

async fn request_body(server: &MockServer) -> String {
    let requests = server.received_requests().await.unwrap_or_default();
    requests
        .last()
        .map(|request| String::from_utf8_lossy(&request.body).to_string())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_explain_streams_rendered_lesson() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", API_KEY))
        .respond_with(stream_response(&[
            "> **Core Concept**: A class is a ",
            "**blueprint**.\n\n## Syntax\n```java\nclass Dog {}\n",
            "```\n- Fields hold state",
        ]))
        .expect(1)
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["explain", "oop_classes", "-d", "advanced"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Classes & Objects (Advanced)"))
        .stdout(predicate::str::contains("│ Core Concept\n│ A class is a blueprint."))
        .stdout(predicate::str::contains("── java ──\n    class Dog {}"))
        .stdout(predicate::str::contains("  • Fields hold state"));

    let body = request_body(&server).await;
    assert!(body.contains("Classes & Objects"));
    assert!(body.contains("Advanced"));
}

#[tokio::test]
async fn test_explain_done_marks_topic_complete() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(STREAM_PATH))
        .respond_with(stream_response(&["Loops repeat work."]))
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["explain", "control_flow", "--done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loops repeat work."))
        .stdout(predicate::str::contains("Course progress: 6%"));

    assert_eq!(
        std::fs::read_to_string(home.path().join("progress.json")).unwrap(),
        r#"["control_flow"]"#
    );
}

#[tokio::test]
async fn test_explain_failure_reports_tutor_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(STREAM_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["explain", "threads"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Sorry, I encountered an error while connecting to the AI tutor.",
        ));
}

#[tokio::test]
async fn test_explain_unknown_topic_makes_no_request() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(stream_response(&["unused"]))
        .expect(0)
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["explain", "kotlin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown topic 'kotlin'"));
}

#[tokio::test]
async fn test_lab_run_prints_simulated_output() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_PATH))
        .respond_with(generate_response("Hello, Java Tutorial!\nReady to learn?\n"))
        .expect(1)
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["lab", "run", "--example", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::diff("Hello, Java Tutorial!\nReady to learn?\n"));

    let body = request_body(&server).await;
    assert!(body.contains("System.out.println"));
}

#[tokio::test]
async fn test_lab_run_compilation_error_fails() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_PATH))
        .respond_with(generate_response("Error: ';' expected on line 3"))
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["lab", "run"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Error: ';' expected on line 3"))
        .stderr(predicate::str::contains("does not compile"));
}

#[tokio::test]
async fn test_lab_run_server_error_prints_fallback() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["lab", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Error connecting to execution engine."));
}

#[tokio::test]
async fn test_lab_analyze_renders_markup() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_PATH))
        .respond_with(generate_response(
            "1. **Compilation Check**: Compiles.\n> **Pro Tip**: Use `final`.",
        ))
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["lab", "analyze", "--example", "loops"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  1. Compilation Check: Compiles."))
        .stdout(predicate::str::contains("│ Pro Tip\n│ Use `final`."));
}

#[tokio::test]
async fn test_lab_visualize_writes_svg() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let out = home.path().join("flow.svg");

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_PATH))
        .respond_with(generate_response(
            "Here you go:\n```svg\n<svg viewBox=\"0 0 10 10\"><rect/></svg>\n```",
        ))
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["lab", "visualize", "--out"])
        .arg(&out)
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "<svg viewBox=\"0 0 10 10\"><rect/></svg>"
    );
}

#[tokio::test]
async fn test_lab_visualize_without_svg_fails() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_PATH))
        .respond_with(generate_response("I cannot draw that."))
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["lab", "visualize"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not generate a visualization"));
}

#[tokio::test]
async fn test_quiz_is_answered_from_stdin() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_PATH))
        .respond_with(generate_response(QUIZ_PAYLOAD))
        .expect(1)
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["quiz", "oop_inheritance", "-d", "intermediate"])
        .write_stdin("2\n1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Q1. Which keyword creates a subclass?"))
        .stdout(predicate::str::contains("  2) extends"))
        .stdout(predicate::str::contains("Q2: wrong. Answer: No"))
        .stdout(predicate::str::contains("Score: 1 / 2"));

    let body = request_body(&server).await;
    assert!(body.contains("responseSchema"));
    assert!(body.contains("Inheritance"));
}

#[tokio::test]
async fn test_quiz_with_unusable_payload_fails() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_PATH))
        .respond_with(generate_response("{ this is not a quiz"))
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .args(["quiz", "streams"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Failed to generate quiz. Please try again.",
        ));
}

#[tokio::test]
async fn test_chat_streams_reply_and_quits() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(STREAM_PATH))
        .respond_with(stream_response(&["Objects live ", "on the **heap**."]))
        .expect(1)
        .mount(&server)
        .await;

    jtutor(&home, &server)
        .arg("chat")
        .write_stdin("Where do objects live?\n/quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("I'm JavaBot."))
        .stdout(predicate::str::contains("Objects live on the heap."));

    let body = request_body(&server).await;
    assert!(body.contains("systemInstruction"));
    assert!(body.contains("Where do objects live?"));
}
