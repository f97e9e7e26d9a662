//! Static course content: topics, difficulty levels and code-lab examples.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One lesson in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    pub id: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    pub description: &'static str,
}

const fn topic(
    id: &'static str,
    title: &'static str,
    category: &'static str,
    description: &'static str,
) -> Topic {
    Topic {
        id,
        title,
        category,
        description,
    }
}

/// Every topic, grouped by category in display order.
pub const TOPICS: &[Topic] = &[
    topic(
        "basics_syntax",
        "Syntax & Variables",
        "Basics",
        "Data types, variables, and basic structure.",
    ),
    topic(
        "control_flow",
        "Control Flow",
        "Basics",
        "If/else, loops, and switch statements.",
    ),
    topic(
        "oop_classes",
        "Classes & Objects",
        "OOP",
        "Blueprints, instances, and constructors.",
    ),
    topic(
        "oop_inheritance",
        "Inheritance",
        "OOP",
        "Extending classes and super keyword.",
    ),
    topic(
        "oop_polymorphism",
        "Polymorphism",
        "OOP",
        "Overriding and overloading methods.",
    ),
    topic(
        "oop_encapsulation",
        "Encapsulation",
        "OOP",
        "Access modifiers and data hiding.",
    ),
    topic(
        "collections",
        "Collections Framework",
        "Core",
        "Lists, Sets, Maps, and iteration.",
    ),
    topic(
        "exceptions",
        "Exception Handling",
        "Core",
        "Try, catch, throw, and custom exceptions.",
    ),
    topic("file_io", "File I/O", "Core", "Reading and writing files."),
    topic(
        "awt_basics",
        "AWT Components",
        "GUI & Legacy",
        "Abstract Window Toolkit basics (Buttons, Labels).",
    ),
    topic(
        "swing_basics",
        "Swing Framework",
        "GUI & Legacy",
        "Modern GUI components (JFrame, JPanel).",
    ),
    topic(
        "applets",
        "Java Applets",
        "GUI & Legacy",
        "Legacy browser-based Java applications.",
    ),
    topic(
        "event_handling",
        "Event Handling",
        "GUI & Legacy",
        "Listeners, events, and user interaction.",
    ),
    topic(
        "streams",
        "Streams API",
        "Advanced",
        "Functional programming and processing data.",
    ),
    topic(
        "threads",
        "Multithreading",
        "Advanced",
        "Concurrency, Runnable, and synchronization.",
    ),
    topic(
        "jdbc",
        "JDBC Database",
        "Advanced",
        "Connecting Java to SQL databases.",
    ),
];

/// Looks up a topic by id.
pub fn find_topic(id: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|topic| topic.id == id)
}

/// Category names in first-appearance order.
pub fn categories() -> Vec<&'static str> {
    let mut seen: Vec<&'static str> = Vec::new();
    for topic in TOPICS {
        if !seen.contains(&topic.category) {
            seen.push(topic.category);
        }
    }
    seen
}

/// Target audience of a lesson or quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!(
                "Unknown difficulty '{other}'. Expected beginner, intermediate or advanced."
            )),
        }
    }
}

/// Starter program for the code lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeExample {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub code: &'static str,
}

pub const EXAMPLES: &[CodeExample] = &[
    CodeExample {
        id: "hello",
        title: "Hello World",
        description: "The classic entry point.",
        code: include_str!("../lab/hello.java"),
    },
    CodeExample {
        id: "vars",
        title: "Variables & Types",
        description: "Storing data in variables.",
        code: include_str!("../lab/vars.java"),
    },
    CodeExample {
        id: "swing_simple",
        title: "Swing GUI",
        description: "Creating a simple window.",
        code: include_str!("../lab/swing_simple.java"),
    },
    CodeExample {
        id: "conditionals",
        title: "Conditionals (If/Else)",
        description: "Making decisions in code.",
        code: include_str!("../lab/conditionals.java"),
    },
    CodeExample {
        id: "loops",
        title: "Loops (For & While)",
        description: "Repeating actions efficiently.",
        code: include_str!("../lab/loops.java"),
    },
    CodeExample {
        id: "methods",
        title: "Methods",
        description: "Reusable blocks of code.",
        code: include_str!("../lab/methods.java"),
    },
];

/// Looks up a lab example by id.
pub fn find_example(id: &str) -> Option<&'static CodeExample> {
    EXAMPLES.iter().find(|example| example.id == id)
}
