//! Artifact file writer
//!
//! Maps artifact identifiers onto the directory layout of each flavor and
//! writes them below an output directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use classforge::naming::{module_name, namespace_segments};
use classforge::{Artifact, ArtifactKind, Flavor, Generation, GenerationConfig};

/// File writer errors
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("two artifacts map to {0}")]
    Collision(PathBuf),

    #[error("migration artifact {0} has no sequence number")]
    MissingSequence(String),
}

/// Writes a generation's artifacts to disk
#[derive(Debug, Clone)]
pub struct FileWriter {
    root: PathBuf,
    flavor: Flavor,
    /// Namespace as directory segments, e.g. `["app"]`
    segments: Vec<String>,
}

impl FileWriter {
    pub fn new(root: impl Into<PathBuf>, config: &GenerationConfig) -> Self {
        Self {
            root: root.into(),
            flavor: config.flavor,
            segments: namespace_segments(&config.namespace),
        }
    }

    /// Path of an artifact relative to the output directory
    pub fn relative_path(&self, artifact: &Artifact) -> Result<PathBuf, WriteError> {
        match self.flavor {
            Flavor::Laravel => self.laravel_path(artifact),
            Flavor::SeaOrm => self.seaorm_path(artifact),
        }
    }

    fn laravel_path(&self, artifact: &Artifact) -> Result<PathBuf, WriteError> {
        let class = artifact.id.subject.as_str();
        let path = match artifact.id.kind {
            ArtifactKind::Env => PathBuf::from(".env"),
            ArtifactKind::DatabaseConfig => PathBuf::from("config/database.php"),
            ArtifactKind::Support => PathBuf::from("app/Support/Support.php"),
            ArtifactKind::Entity | ArtifactKind::JoinEntity => {
                PathBuf::from(format!("app/Models/{}.php", class))
            }
            ArtifactKind::Validation => {
                PathBuf::from(format!("app/Http/Requests/{}Request.php", class))
            }
            ArtifactKind::Repository => PathBuf::from(format!(
                "app/Repositories/Contracts/{}RepositoryInterface.php",
                class
            )),
            ArtifactKind::RepositoryImpl => {
                PathBuf::from(format!("app/Repositories/Eloquent{}Repository.php", class))
            }
            ArtifactKind::Service => PathBuf::from(format!("app/Services/{}Service.php", class)),
            ArtifactKind::Controller => {
                PathBuf::from(format!("app/Http/Controllers/{}Controller.php", class))
            }
            ArtifactKind::Filter => PathBuf::from(format!("app/Filters/{}Filter.php", class)),
            ArtifactKind::Migration | ArtifactKind::JoinMigration => {
                let (sequence, table) = migration_parts(artifact)?;
                PathBuf::from(format!(
                    "database/migrations/2024_01_01_{:06}_create_{}_table.php",
                    sequence, table
                ))
            }
        };
        Ok(path)
    }

    fn seaorm_path(&self, artifact: &Artifact) -> Result<PathBuf, WriteError> {
        let module = module_name(&artifact.id.subject);
        let file = match artifact.id.kind {
            ArtifactKind::Env => return Ok(PathBuf::from(".env")),
            ArtifactKind::Migration | ArtifactKind::JoinMigration => {
                let (sequence, table) = migration_parts(artifact)?;
                return Ok(PathBuf::from(format!(
                    "migrations/{:04}_create_{}.sql",
                    sequence, table
                )));
            }
            ArtifactKind::DatabaseConfig => "db.rs".to_string(),
            ArtifactKind::Support => "support.rs".to_string(),
            ArtifactKind::Entity | ArtifactKind::JoinEntity => format!("entities/{}.rs", module),
            ArtifactKind::Validation => format!("requests/{}_request.rs", module),
            ArtifactKind::Repository => format!("repositories/{}_repository.rs", module),
            ArtifactKind::RepositoryImpl => format!("repositories/seaorm_{}_repository.rs", module),
            ArtifactKind::Service => format!("services/{}_service.rs", module),
            ArtifactKind::Controller => format!("controllers/{}_controller.rs", module),
            ArtifactKind::Filter => format!("filters/{}_filter.rs", module),
        };

        let mut path = PathBuf::from("src");
        path.extend(&self.segments);
        path.push(file);
        Ok(path)
    }

    /// Every artifact with its destination, rejecting collisions
    pub fn plan<'g>(&self, generation: &'g Generation) -> Result<Vec<(PathBuf, &'g Artifact)>, WriteError> {
        let mut seen = BTreeSet::new();
        let mut planned = Vec::with_capacity(generation.artifacts.len());
        for artifact in &generation.artifacts {
            let path = self.root.join(self.relative_path(artifact)?);
            if !seen.insert(path.clone()) {
                return Err(WriteError::Collision(path));
            }
            planned.push((path, artifact));
        }
        Ok(planned)
    }

    /// Write every artifact, returning the written paths in emission order
    pub fn write(&self, generation: &Generation) -> Result<Vec<PathBuf>, WriteError> {
        let planned = self.plan(generation)?;
        let mut written = Vec::with_capacity(planned.len());
        for (path, artifact) in planned {
            write_file(&path, &artifact.text)?;
            tracing::debug!(path = %path.display(), artifact = %artifact.id, "Wrote artifact");
            written.push(path);
        }
        Ok(written)
    }
}

fn migration_parts(artifact: &Artifact) -> Result<(usize, &str), WriteError> {
    match (artifact.sequence, artifact.table.as_deref()) {
        (Some(sequence), Some(table)) => Ok((sequence, table)),
        _ => Err(WriteError::MissingSequence(artifact.id.to_string())),
    }
}

fn write_file(path: &Path, text: &str) -> Result<(), WriteError> {
    let io = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    fs::write(path, text).map_err(io)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = "class User { email: string }\nclass Order { total: decimal }\nUser \"1\" -- \"*\" Order\n";

    #[test]
    fn test_laravel_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = GenerationConfig::for_flavor(Flavor::Laravel);
        let generation = classforge::generate(SHOP, &config).unwrap();
        let written = FileWriter::new(dir.path(), &config).write(&generation).unwrap();

        assert_eq!(written.len(), generation.artifacts.len());
        assert!(dir.path().join(".env").exists());
        assert!(dir.path().join("app/Models/Order.php").exists());
        assert!(dir.path().join("app/Repositories/EloquentOrderRepository.php").exists());
        assert!(
            dir.path()
                .join("database/migrations/2024_01_01_000001_create_users_table.php")
                .exists()
        );
        let model = fs::read_to_string(dir.path().join("app/Models/User.php")).unwrap();
        assert_eq!(model, generation.text("User:entity").unwrap());
    }

    #[test]
    fn test_seaorm_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GenerationConfig::for_flavor(Flavor::SeaOrm);
        config.namespace = "Shop".to_string();
        let generation = classforge::generate(
            "class Post { title: string }\nclass Tag { name: string }\nPost \"*\" -- \"*\" Tag\n",
            &config,
        )
        .unwrap();
        FileWriter::new(dir.path(), &config).write(&generation).unwrap();

        assert!(dir.path().join("src/shop/db.rs").exists());
        assert!(dir.path().join("src/shop/support.rs").exists());
        assert!(dir.path().join("src/shop/entities/post.rs").exists());
        assert!(dir.path().join("src/shop/entities/post_tag.rs").exists());
        assert!(dir.path().join("src/shop/repositories/seaorm_tag_repository.rs").exists());
        assert!(dir.path().join("migrations/0003_create_post_tag.sql").exists());
    }

    #[test]
    fn test_plan_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let config = GenerationConfig::for_flavor(Flavor::SeaOrm);
        let generation = classforge::generate(SHOP, &config).unwrap();
        let planned = FileWriter::new(dir.path(), &config).plan(&generation).unwrap();
        assert_eq!(planned.len(), generation.artifacts.len());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
