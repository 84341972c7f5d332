//! Builds the argument vector for `run_cmd`
//!
//! Plain images get the command wrapped in `sh -c`. Known database-server
//! images get the command rewritten into their client's command line.

use std::sync::LazyLock;

use regex::Regex;

const MONGO_DEFAULT_PORT: u16 = 27017;

/// Lowercased collection methods and their canonical spelling
const MONGO_METHODS: &[(&str, &str)] = &[
    ("insertone", "insertOne"),
    ("insertmany", "insertMany"),
    ("findone", "findOne"),
    ("updateone", "updateOne"),
    ("updatemany", "updateMany"),
    ("deleteone", "deleteOne"),
    ("deletemany", "deleteMany"),
    ("countdocuments", "countDocuments"),
];

static MONGO_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    let names: Vec<&str> = MONGO_METHODS.iter().map(|(lower, _)| *lower).collect();
    Regex::new(&format!(r"\.({})\(", names.join("|"))).unwrap()
});

/// Database families with a dedicated command translator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFamily {
    Mongo,
    Generic,
}

impl ImageFamily {
    /// Classify an image reference such as `mongo:7` or `docker.io/library/mongo`
    pub fn of(image: &str) -> Self {
        let without_tag = image.split(['@', ':']).next().unwrap_or(image);
        let repo = without_tag.rsplit('/').next().unwrap_or(without_tag);
        match repo {
            "mongo" => ImageFamily::Mongo,
            _ => ImageFamily::Generic,
        }
    }
}

/// Argument vector that runs `command` inside a unit built from `image`
pub fn build_argv(image: &str, port: Option<u16>, command: &str) -> Vec<String> {
    match ImageFamily::of(image) {
        ImageFamily::Mongo => vec![
            "mongosh".to_string(),
            "--host".to_string(),
            "localhost".to_string(),
            "--port".to_string(),
            port.unwrap_or(MONGO_DEFAULT_PORT).to_string(),
            "--eval".to_string(),
            normalize_mongo_methods(command),
        ],
        ImageFamily::Generic => vec!["sh".to_string(), "-c".to_string(), command.to_string()],
    }
}

fn normalize_mongo_methods(command: &str) -> String {
    MONGO_METHOD
        .replace_all(command, |caps: &regex::Captures<'_>| {
            let canonical = MONGO_METHODS
                .iter()
                .find(|(lower, _)| *lower == &caps[1])
                .map(|(_, canonical)| *canonical)
                .unwrap_or(&caps[1]);
            format!(".{}(", canonical)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_family() {
        assert_eq!(ImageFamily::of("mongo"), ImageFamily::Mongo);
        assert_eq!(ImageFamily::of("mongo:7.0"), ImageFamily::Mongo);
        assert_eq!(ImageFamily::of("docker.io/library/mongo:latest"), ImageFamily::Mongo);
        assert_eq!(ImageFamily::of("mongo-express"), ImageFamily::Generic);
        assert_eq!(ImageFamily::of("nginx"), ImageFamily::Generic);
    }

    #[test]
    fn test_generic_image_uses_shell() {
        assert_eq!(build_argv("alpine", None, "echo hi"), vec!["sh", "-c", "echo hi"]);
    }

    #[test]
    fn test_mongo_command_is_translated() {
        let argv = build_argv("mongo", None, "db.users.insertone({name: 'a'})");
        assert_eq!(argv[0], "mongosh");
        assert_eq!(argv[4], "27017");
        assert_eq!(argv[6], "db.users.insertOne({name: 'a'})");
    }

    #[test]
    fn test_mongo_uses_exposed_port() {
        let argv = build_argv("mongo:6", Some(27018), "db.users.findone()");
        assert_eq!(argv[4], "27018");
        assert_eq!(argv[6], "db.users.findOne()");
    }

    #[test]
    fn test_mongo_canonical_methods_untouched() {
        let argv = build_argv("mongo", None, "db.users.insertOne({})");
        assert_eq!(argv[6], "db.users.insertOne({})");
    }
}
