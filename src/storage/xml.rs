use encoding_rs::Encoding;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{Cursor, ErrorKind};
use std::path::PathBuf;
use std::sync::PoisonError;

use super::atomic::{self, lock::FileLock, AtomicFile};
use crate::config::StorageConfig;
use crate::domain::Project;
use crate::error::{Error, Result, StorageError};

/// XML-backed project repository.
///
/// The whole document is loaded on every operation and rewritten on every
/// mutation. Lookups are a linear scan on the `id` attribute. Acceptable for
/// the data scale this targets; the public contract would survive an indexed
/// implementation unchanged.
#[derive(Debug, Clone)]
pub struct XmlProjectRepository {
    file_path: PathBuf,
    lock_path: PathBuf,
    encoding: &'static Encoding,
}

impl XmlProjectRepository {
    /// Open the repository, creating the parent directory and seeding an
    /// empty document when the backing file does not exist yet.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let file_path = config.projects_path.clone();

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::AccessError {
                    path: parent.to_path_buf(),
                    message: e.to_string(),
                })?;
            }
        }

        let mut lock_name = OsString::from(file_path.as_os_str());
        lock_name.push(".lock");

        let repository = Self {
            file_path,
            lock_path: PathBuf::from(lock_name),
            encoding: config.encoding(),
        };

        if !repository.file_path.exists() {
            let lock = atomic::path_lock(&repository.file_path);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            if !repository.file_path.exists() {
                tracing::debug!(path = %repository.file_path.display(), "seeding empty project document");
                repository.save(&[])?;
            }
        }

        Ok(repository)
    }

    /// All projects in document order. Missing child elements read as empty
    /// strings; only a malformed document fails.
    pub fn list_all(&self) -> Result<Vec<Project>> {
        let lock = atomic::path_lock(&self.file_path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load()
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Project>> {
        let lock = atomic::path_lock(&self.file_path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.into_iter().find(|p| p.id == id))
    }

    /// Insert-or-update keyed by id. An existing element keeps its position
    /// and id; only the three value fields are rewritten. Returns the project
    /// as given.
    pub fn upsert(&self, project: &Project) -> Result<Project> {
        let lock = atomic::path_lock(&self.file_path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _file_lock = self.exclusive_file_lock()?;

        let mut projects = self.load()?;
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => {
                existing.name = project.name.clone();
                existing.abbreviation = project.abbreviation.clone();
                existing.customer = project.customer.clone();
            }
            None => projects.push(project.clone()),
        }

        self.save(&projects)?;
        Ok(project.clone())
    }

    /// Remove a project by id. Returns false, without saving, when no
    /// element matches.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let lock = atomic::path_lock(&self.file_path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _file_lock = self.exclusive_file_lock()?;

        let mut projects = self.load()?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Ok(false);
        }

        self.save(&projects)?;
        Ok(true)
    }

    fn load(&self) -> Result<Vec<Project>> {
        let bytes = match fs::read(&self.file_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::AccessError {
                    path: self.file_path.clone(),
                    message: e.to_string(),
                }
                .into())
            }
        };

        let (text, _, _) = self.encoding.decode(&bytes);
        parse_document(&text)
    }

    fn save(&self, projects: &[Project]) -> Result<()> {
        let bytes = self.render_document(projects)?;
        AtomicFile::new(&self.file_path)
            .and_then(|file| file.write(&bytes))
            .map_err(|e| StorageError::AccessError {
                path: self.file_path.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn render_document(&self, projects: &[Project]) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        let serialize = |e: &dyn std::fmt::Display| StorageError::Corrupted(e.to_string());

        writer
            .write_event(Event::Decl(BytesDecl::new(
                "1.0",
                Some(self.encoding.name()),
                None,
            )))
            .map_err(|e| serialize(&e))?;
        writer
            .write_event(Event::Start(BytesStart::new("projects")))
            .map_err(|e| serialize(&e))?;

        for project in projects {
            let mut start = BytesStart::new("project");
            start.push_attribute(("id", project.id.as_str()));
            writer
                .write_event(Event::Start(start))
                .map_err(|e| serialize(&e))?;

            let fields = [
                ("name", &project.name),
                ("abbreviation", &project.abbreviation),
                ("customer", &project.customer),
            ];
            for (tag, value) in fields {
                writer
                    .write_event(Event::Start(BytesStart::new(tag)))
                    .map_err(|e| serialize(&e))?;
                writer
                    .write_event(Event::Text(BytesText::new(value)))
                    .map_err(|e| serialize(&e))?;
                writer
                    .write_event(Event::End(BytesEnd::new(tag)))
                    .map_err(|e| serialize(&e))?;
            }

            writer
                .write_event(Event::End(BytesEnd::new("project")))
                .map_err(|e| serialize(&e))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("projects")))
            .map_err(|e| serialize(&e))?;

        let text = String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| StorageError::Corrupted(e.to_string()))?;

        // Unmappable characters become numeric character references, which
        // the unescaper turns back into text on the next load.
        let (bytes, _, _) = self.encoding.encode(&text);
        Ok(bytes.into_owned())
    }

    fn exclusive_file_lock(&self) -> Result<FileLock> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| StorageError::AccessError {
                path: self.lock_path.clone(),
                message: e.to_string(),
            })?;

        FileLock::acquire(file).map_err(|_| Error::from(StorageError::Locked))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Name,
    Abbreviation,
    Customer,
}

fn parse_document(text: &str) -> Result<Vec<Project>> {
    // Whitespace in field values is significant, so no text trimming here;
    // indentation between elements never lands in a tracked field.
    let mut reader = Reader::from_str(text);

    let mut projects = Vec::new();
    let mut current: Option<Project> = None;
    let mut field = Field::None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| StorageError::Corrupted(e.to_string()))?;
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"project" => current = Some(project_from_attributes(&e)?),
                b"name" if current.is_some() => field = Field::Name,
                b"abbreviation" if current.is_some() => field = Field::Abbreviation,
                b"customer" if current.is_some() => field = Field::Customer,
                _ => {}
            },
            Event::Empty(e) => {
                if e.name().as_ref() == b"project" {
                    projects.push(project_from_attributes(&e)?);
                }
            }
            Event::Text(t) => {
                if let Some(project) = current.as_mut() {
                    let value = t
                        .unescape()
                        .map_err(|e| StorageError::Corrupted(e.to_string()))?
                        .into_owned();
                    match field {
                        Field::Name => project.name = value,
                        Field::Abbreviation => project.abbreviation = value,
                        Field::Customer => project.customer = value,
                        Field::None => {}
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"project" => {
                    if let Some(project) = current.take() {
                        projects.push(project);
                    }
                    field = Field::None;
                }
                b"name" | b"abbreviation" | b"customer" => field = Field::None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(projects)
}

fn project_from_attributes(e: &BytesStart) -> Result<Project> {
    let mut project = Project::default();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| StorageError::Corrupted(err.to_string()))?;
        if attr.key.as_ref() == b"id" {
            project.id = attr
                .unescape_value()
                .map_err(|err| StorageError::Corrupted(err.to_string()))?
                .into_owned();
        }
    }
    Ok(project)
}
