use crate::error::{EmberError, Result};
use crate::storage::{Collection, validate_collection_id};
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const DATA_FILE_SUFFIX: &str = ".tsdata";

/// Durable tier: one serialized data file per collection in a flat data
/// directory.
pub struct ColdStore {
    data_dir: PathBuf,
}

impl ColdStore {
    /// Creates a cold store rooted at `data_dir`, creating the directory if it
    /// does not already exist.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if data_dir.is_dir() {
            tracing::info!(path = %data_dir.display(), "found existing data directory");
        } else {
            tracing::info!(path = %data_dir.display(), "creating data directory");
            fs::create_dir_all(&data_dir)?;
        }

        Ok(Self { data_dir })
    }

    /// Distinct ids of every persisted collection, found by scanning the data
    /// directory for well-formed `<id>.tsdata` files.
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(id) = name.strip_suffix(DATA_FILE_SUFFIX) {
                if validate_collection_id(id).is_ok() {
                    ids.push(id.to_string());
                }
            }
        }

        Ok(ids)
    }

    /// True iff a backing file for `id` is present and is a regular file. A
    /// path of any other type is an error, not `false`.
    pub fn collection_exists(&self, id: &str) -> Result<bool> {
        let path = self.data_file_path(id)?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(true),
            Ok(_) => Err(EmberError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "data file [{}] is not a regular file",
                    path.display()
                ),
            ))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Deserializes the full collection from its data file.
    pub fn read(&self, id: &str) -> Result<Collection> {
        let path = self.data_file_path(id)?;
        tracing::info!(collection = id, "reading collection from disk");

        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EmberError::CollectionNotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
            EmberError::Deserialization {
                collection: id.to_string(),
                source: e,
            }
        })
    }

    /// Serializes and durably overwrites the data file for `id`, creating it
    /// if absent.
    ///
    /// The encoding goes to a temp file in the same directory which is then
    /// renamed over the target, so a concurrent reader sees either the prior
    /// complete file or the new one, never a partial write.
    pub fn write(&self, id: &str, data: &Collection) -> Result<()> {
        let path = self.data_file_path(id)?;
        tracing::info!(collection = id, "flushing collection to disk");

        let mut tmp = NamedTempFile::new_in(&self.data_dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            bincode::serialize_into(&mut writer, data)?;
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|e| EmberError::Io(e.error))?;

        Ok(())
    }

    fn data_file_path(&self, id: &str) -> Result<PathBuf> {
        validate_collection_id(id)?;
        Ok(self.data_dir.join(format!("{id}{DATA_FILE_SUFFIX}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_collection() -> Collection {
        let mut data = Collection::new();
        data.insert("cpu".to_string(), "93.5".to_string());
        data.insert("mem".to_string(), "412".to_string());
        data
    }

    #[test]
    fn write_then_read_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let cold = ColdStore::new(dir.path())?;

        let data = sample_collection();
        cold.write("metrics", &data)?;
        assert_eq!(cold.read("metrics")?, data);

        Ok(())
    }

    #[test]
    fn read_absent_collection_is_not_found() -> Result<()> {
        let dir = tempdir()?;
        let cold = ColdStore::new(dir.path())?;

        assert!(matches!(
            cold.read("ghost"),
            Err(EmberError::CollectionNotFound(id)) if id == "ghost"
        ));
        assert!(!cold.collection_exists("ghost")?);

        Ok(())
    }

    #[test]
    fn listing_ignores_foreign_files() -> Result<()> {
        let dir = tempdir()?;
        let cold = ColdStore::new(dir.path())?;

        cold.write("metrics", &sample_collection())?;
        fs::write(dir.path().join("notes.txt"), b"scratch")?;
        fs::create_dir(dir.path().join("nested.tsdata"))?;

        assert_eq!(cold.list_collections()?, vec!["metrics".to_string()]);

        Ok(())
    }

    #[test]
    fn overwrite_replaces_previous_contents() -> Result<()> {
        let dir = tempdir()?;
        let cold = ColdStore::new(dir.path())?;

        cold.write("metrics", &sample_collection())?;
        let mut smaller = Collection::new();
        smaller.insert("cpu".to_string(), "12.0".to_string());
        cold.write("metrics", &smaller)?;

        assert_eq!(cold.read("metrics")?, smaller);

        Ok(())
    }

    #[test]
    fn rejects_ids_that_escape_the_data_dir() {
        let dir = tempdir().unwrap();
        let cold = ColdStore::new(dir.path()).unwrap();

        assert!(matches!(
            cold.write("../escape", &Collection::new()),
            Err(EmberError::InvalidCollectionId(_))
        ));
        assert!(matches!(
            cold.collection_exists(""),
            Err(EmberError::InvalidCollectionId(_))
        ));
    }
}
