use encoding_rs::UTF_8;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;

/// Load configuration from an XML file.
///
/// A missing file, unreadable file, or malformed document degrades to the
/// built-in defaults; a present but blank field falls back to that field's
/// default. This function never fails.
pub fn load_or_default(config_path: impl AsRef<Path>) -> AppConfig {
    let config_path = config_path.as_ref();
    let config_dir = config_directory(config_path);
    let mut config = AppConfig::default();

    if config_path.exists() {
        match fs::read(config_path) {
            Ok(bytes) => {
                let (text, _, _) = UTF_8.decode(&bytes);
                match parse(&text) {
                    Some(raw) => apply(&mut config, raw),
                    None => {
                        tracing::warn!(
                            path = %config_path.display(),
                            "malformed config file, using defaults"
                        );
                    }
                }
            }
            Err(err) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %err,
                    "failed to read config file, using defaults"
                );
            }
        }
    }

    // A relative storage path is anchored at the config file's directory.
    if config.storage.projects_path.is_relative() {
        config.storage.projects_path = config_dir.join(&config.storage.projects_path);
    }

    config
}

#[derive(Debug, Default)]
struct RawConfig {
    projects_path: Option<String>,
    encoding: Option<String>,
    username: Option<String>,
    password: Option<String>,
    jwt_key: Option<String>,
    issuer: Option<String>,
    audience: Option<String>,
    expires_hours: Option<String>,
}

fn parse(text: &str) -> Option<RawConfig> {
    let mut reader = Reader::from_str(text);

    let mut raw = RawConfig::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(t)) => {
                // Leaf values sit two levels below the document root:
                // <configuration><storage><projectsPath>…
                if path.len() == 3 {
                    let value = t.unescape().ok()?.into_owned();
                    match (path[1].as_str(), path[2].as_str()) {
                        ("storage", "projectsPath") => raw.projects_path = Some(value),
                        ("storage", "encoding") => raw.encoding = Some(value),
                        ("auth", "username") => raw.username = Some(value),
                        ("auth", "passwordHash") => raw.password = Some(value),
                        ("jwt", "key") => raw.jwt_key = Some(value),
                        ("jwt", "issuer") => raw.issuer = Some(value),
                        ("jwt", "audience") => raw.audience = Some(value),
                        ("jwt", "expiresHours") => raw.expires_hours = Some(value),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    Some(raw)
}

fn apply(config: &mut AppConfig, raw: RawConfig) {
    if let Some(value) = non_blank(raw.projects_path) {
        config.storage.projects_path = PathBuf::from(value);
    }
    if let Some(value) = non_blank(raw.encoding) {
        config.storage.encoding_name = value;
    }
    if let Some(value) = non_blank(raw.username) {
        config.auth.username = value;
    }
    if let Some(value) = raw.password {
        config.auth.password = value;
    }
    if let Some(value) = non_blank(raw.jwt_key) {
        config.jwt.key = Some(value);
    }
    if let Some(value) = non_blank(raw.issuer) {
        config.jwt.issuer = value;
    }
    if let Some(value) = non_blank(raw.audience) {
        config.jwt.audience = value;
    }
    if let Some(hours) = non_blank(raw.expires_hours).and_then(|v| v.parse::<i64>().ok()) {
        if hours > 0 {
            config.jwt.expires_hours = hours;
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn config_directory(config_path: &Path) -> PathBuf {
    let absolute = if config_path.is_absolute() {
        config_path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(config_path))
            .unwrap_or_else(|_| config_path.to_path_buf())
    };

    absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.xml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_or_default(dir.path().join("config.xml"));

        assert_eq!(config.auth.username, "admin");
        assert_eq!(config.storage.encoding_name, "windows-1250");
        assert!(config.storage.projects_path.ends_with("data/projects.xml"));
    }

    #[test]
    fn test_full_config_is_parsed() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"<configuration>
  <storage>
    <projectsPath>store/plist.xml</projectsPath>
    <encoding>utf-8</encoding>
  </storage>
  <auth>
    <username>boss</username>
    <passwordHash>s3cret</passwordHash>
  </auth>
  <jwt>
    <issuer>acme</issuer>
    <expiresHours>2</expiresHours>
  </jwt>
</configuration>"#,
        );

        let config = load_or_default(&path);
        assert_eq!(config.auth.username, "boss");
        assert_eq!(config.auth.password, "s3cret");
        assert_eq!(config.storage.encoding_name, "utf-8");
        assert_eq!(config.jwt.issuer, "acme");
        assert_eq!(config.jwt.expires_hours, 2);
        assert_eq!(
            config.storage.projects_path,
            dir.path().join("store/plist.xml")
        );
    }

    #[test]
    fn test_blank_fields_fall_back() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"<configuration>
  <storage>
    <projectsPath>   </projectsPath>
    <encoding></encoding>
  </storage>
  <auth>
    <username> </username>
  </auth>
</configuration>"#,
        );

        let config = load_or_default(&path);
        assert_eq!(config.auth.username, "admin");
        assert_eq!(config.storage.encoding_name, "windows-1250");
        assert!(config.storage.projects_path.ends_with("data/projects.xml"));
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "<configuration><storage>");

        let config = load_or_default(&path);
        assert_eq!(config.auth.username, "admin");
        assert_eq!(config.jwt.expires_hours, 8);
    }

    #[test]
    fn test_absolute_projects_path_is_kept() {
        let dir = TempDir::new().unwrap();
        let absolute = if cfg!(windows) {
            r"C:\data\projects.xml"
        } else {
            "/var/lib/projman/projects.xml"
        };
        let path = write_config(
            &dir,
            &format!(
                "<configuration><storage><projectsPath>{}</projectsPath></storage></configuration>",
                absolute
            ),
        );

        let config = load_or_default(&path);
        assert_eq!(config.storage.projects_path, PathBuf::from(absolute));
    }
}
