//! Content store: authored markdown records grouped into collections.
//!
//! # Layout
//!
//! ```text
//! src/content/
//! ├── blog/
//! │   ├── hello-world.md        → slug `hello-world`
//! │   └── java/Streams.mdx      → slug `java/streams`
//! └── store/
//!     └── curso-java.md         → slug `curso-java`
//! ```
//!
//! Files starting with `_` are ignored. Entries are yielded sorted by id,
//! and that order is what the feed and sitemap keep.

mod frontmatter;
mod slug;

pub use frontmatter::Frontmatter;

use crate::schema::{self, BlogPost, ImageProbe, Record, StoreItem, ValidationErrors};
use anyhow::{Context, Result, anyhow, bail};
use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

/// Frontmatter key that overrides the slug derived from the file path.
const SLUG_KEY: &str = "slug";

/// File extensions recognized as content entries.
const CONTENT_EXTENSIONS: [&str; 2] = ["md", "mdx"];

/// Named content collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Blog,
    Store,
}

impl CollectionKind {
    /// Directory name under the content root.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::Store => "store",
        }
    }

    /// Public route prefix of the collection's pages.
    pub const fn route(self) -> &'static str {
        match self {
            Self::Blog => "/blog",
            Self::Store => "/tienda",
        }
    }

    /// Page path of one entry, e.g. `/blog/hello-world/`.
    pub fn permalink(self, slug: &str) -> String {
        format!("{}/{slug}/", self.route())
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One content record: identity, source body and a data payload.
///
/// `T` is [`Frontmatter`] straight out of the store, or a validated
/// record type ([`BlogPost`], [`StoreItem`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    /// Path relative to the collection directory, e.g. `java/streams.mdx`.
    pub id: String,
    pub slug: String,
    /// Source file, used to resolve relative image references.
    pub path: PathBuf,
    /// Raw markdown after the frontmatter fence.
    pub body: String,
    pub data: T,
}

pub type RawEntry = Entry<Frontmatter>;

/// Read-only access to the content directory.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load every entry of a collection, sorted by id.
    ///
    /// A missing collection directory is an empty collection.
    pub fn get_collection(&self, kind: CollectionKind) -> Result<Vec<RawEntry>> {
        let dir = self.root.join(kind.name());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut slugs: HashMap<String, String> = HashMap::new();

        for file in WalkDir::new(&dir).sort_by_file_name() {
            let file = file.with_context(|| format!("reading {}", dir.display()))?;
            if !file.file_type().is_file() || !is_content_file(file.path()) {
                continue;
            }

            let entry = Self::load_entry(&dir, file.path())?;
            if let Some(previous) = slugs.insert(entry.slug.clone(), entry.id.clone()) {
                bail!(
                    "{kind}: `{}` and `{previous}` resolve to the same slug `{}`",
                    entry.id,
                    entry.slug
                );
            }
            entries.push(entry);
        }

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    fn load_entry(dir: &Path, path: &Path) -> Result<RawEntry> {
        let id = path
            .strip_prefix(dir)
            .map_err(|_| anyhow!("File is not in collection directory: {}", path.display()))?
            .to_str()
            .ok_or_else(|| anyhow!("Invalid path encoding: {}", path.display()))?
            .replace('\\', "/");

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let (mut data, body) =
            frontmatter::split(&text).with_context(|| format!("Failed to parse {id}"))?;

        let slug = match data.remove(SLUG_KEY) {
            Some(serde_yaml::Value::String(slug)) => match slug.trim_matches('/') {
                "" => bail!("{id}: `slug` must not be empty"),
                slug => slug.to_owned(),
            },
            Some(other) => bail!("{id}: `slug` must be a string, found `{other:?}`"),
            None => slug::slug_from_id(&id),
        };

        Ok(Entry {
            id,
            slug,
            path: path.to_path_buf(),
            body: body.to_owned(),
            data,
        })
    }
}

/// Markdown files whose name does not start with `_`.
fn is_content_file(path: &Path) -> bool {
    let underscored = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('_'));
    let has_content_ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CONTENT_EXTENSIONS.contains(&ext));

    has_content_ext && !underscored
}

/// A record that failed schema validation.
#[derive(Debug, Error)]
#[error("{collection}/{id}: {errors}")]
pub struct RecordFailure {
    pub collection: CollectionKind,
    pub id: String,
    pub errors: ValidationErrors,
}

impl RecordFailure {
    /// `<collection>/<id>:` followed by one indented line per violation.
    pub fn report_lines(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(format!("{}/{}:", self.collection, self.id))
            .chain(self.errors.iter().map(|err| format!("  {err}")))
    }
}

/// Every failing record of a load; nothing is published when this occurs.
#[derive(Debug, Error)]
#[error("{} content record(s) failed validation\n{}", .0.len(), report(.0))]
pub struct InvalidContent(pub Vec<RecordFailure>);

fn report(failures: &[RecordFailure]) -> String {
    failures
        .iter()
        .flat_map(RecordFailure::report_lines)
        .collect::<Vec<_>>()
        .join("\n")
}

/// All collections after validation.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub blog: Vec<Entry<BlogPost>>,
    pub store: Vec<Entry<StoreItem>>,
}

impl Collections {
    /// Load and validate every collection.
    ///
    /// Validation failures of all records are gathered into one
    /// [`InvalidContent`] error instead of stopping at the first record.
    pub fn load(store: &ContentStore, probe: &dyn ImageProbe) -> Result<Self> {
        let mut failures = Vec::new();

        let blog = validate_collection::<BlogPost>(store, probe, &mut failures)?;
        let store_items = validate_collection::<StoreItem>(store, probe, &mut failures)?;

        if !failures.is_empty() {
            return Err(InvalidContent(failures).into());
        }

        Ok(Self {
            blog,
            store: store_items,
        })
    }
}

fn validate_collection<T: Record>(
    store: &ContentStore,
    probe: &dyn ImageProbe,
    failures: &mut Vec<RecordFailure>,
) -> Result<Vec<Entry<T>>> {
    let raw = store.get_collection(T::KIND)?;
    let mut validated = Vec::with_capacity(raw.len());

    for entry in raw {
        match schema::validate_as::<T>(&entry, probe) {
            Ok(data) => validated.push(Entry {
                id: entry.id,
                slug: entry.slug,
                path: entry.path,
                body: entry.body,
                data,
            }),
            Err(errors) => failures.push(RecordFailure {
                collection: T::KIND,
                id: entry.id,
                errors,
            }),
        }
    }

    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_support::FakeProbe;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    const POST: &str = "---\ntitle: Hola\ndescription: d\npubDate: 2024-01-01\nheroImage: ./hero.png\n---\nBody\n";
    const ITEM: &str = "---\ntitle: Curso\ndescription: d\ncustom_link_label: Comprar\nupdatedDate: 2024-02-01\nheroImage: /curso.png\n---\n";

    #[test]
    fn test_get_collection_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "blog/b-post.md", POST);
        write(root, "blog/a-post.mdx", POST);
        write(root, "blog/_draft.md", POST);
        write(root, "blog/hero.png", "not content");
        write(root, "blog/java/Streams API.md", POST);

        let store = ContentStore::new(root);
        let entries = store.get_collection(CollectionKind::Blog).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        let slugs: Vec<_> = entries.iter().map(|e| e.slug.as_str()).collect();

        assert_eq!(ids, ["a-post.mdx", "b-post.md", "java/Streams API.md"]);
        assert_eq!(slugs, ["a-post", "b-post", "java/streams-api"]);
        assert_eq!(entries[0].body, "Body\n");
        assert_eq!(entries[0].data["title"].as_str(), Some("Hola"));
    }

    #[test]
    fn test_get_collection_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path());
        assert!(store.get_collection(CollectionKind::Store).unwrap().is_empty());
    }

    #[test]
    fn test_frontmatter_slug_overrides_path() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "blog/2024-01-01-hola.md",
            "---\nslug: /hola/\ntitle: Hola\n---\n",
        );

        let entries = ContentStore::new(dir.path())
            .get_collection(CollectionKind::Blog)
            .unwrap();
        assert_eq!(entries[0].slug, "hola");
        assert!(!entries[0].data.contains_key("slug"));
    }

    #[test]
    fn test_empty_slug_override_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/hola.md", "---\nslug: /\ntitle: Hola\n---\n");

        let err = ContentStore::new(dir.path())
            .get_collection(CollectionKind::Blog)
            .unwrap_err();
        assert!(err.to_string().contains("`slug` must not be empty"));
    }

    #[test]
    fn test_record_failure_reports_each_violation_on_its_own_line() {
        let fields = ["title", "description", "pubDate", "heroImage"];
        let failure = RecordFailure {
            collection: CollectionKind::Blog,
            id: "java/introduccion-a-streams.md".into(),
            errors: ValidationErrors(
                fields
                    .iter()
                    .map(|field| crate::schema::ValidationError::MissingField {
                        field: field.to_string(),
                    })
                    .collect(),
            ),
        };

        let lines: Vec<_> = failure.report_lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "blog/java/introduccion-a-streams.md:");
        for (line, field) in lines[1..].iter().zip(fields) {
            assert_eq!(*line, format!("  `{field}` is required"));
        }

        let invalid = InvalidContent(vec![failure]).to_string();
        assert!(invalid.starts_with("1 content record(s) failed validation\n"));
        assert!(fields.iter().all(|field| invalid.contains(&format!("`{field}` is required"))));
    }

    #[test]
    fn test_duplicate_slug_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/Hola Mundo.md", POST);
        write(dir.path(), "blog/hola-mundo.mdx", POST);

        let err = ContentStore::new(dir.path())
            .get_collection(CollectionKind::Blog)
            .unwrap_err();
        assert!(err.to_string().contains("same slug `hola-mundo`"));
    }

    #[test]
    fn test_permalink() {
        assert_eq!(CollectionKind::Blog.permalink("hello-world"), "/blog/hello-world/");
        assert_eq!(CollectionKind::Store.permalink("curso"), "/tienda/curso/");
    }

    #[test]
    fn test_collections_load_valid() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/hola.md", POST);
        write(dir.path(), "store/curso.md", ITEM);

        let probe = FakeProbe::new(&[("./hero.png", 1200), ("/curso.png", 300)]);
        let collections = Collections::load(&ContentStore::new(dir.path()), &probe).unwrap();

        assert_eq!(collections.blog.len(), 1);
        assert_eq!(collections.blog[0].slug, "hola");
        assert_eq!(collections.blog[0].data.title, "Hola");
        assert_eq!(collections.store.len(), 1);
        assert_eq!(collections.store[0].data.custom_link_label, "Comprar");
    }

    #[test]
    fn test_collections_load_reports_every_failing_record() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/ok.md", POST);
        write(dir.path(), "blog/no-title.md", "---\ndescription: d\npubDate: 2024-01-01\nheroImage: ./hero.png\n---\n");
        write(dir.path(), "store/no-label.md", "---\ntitle: t\ndescription: d\nupdatedDate: 2024-01-01\nheroImage: /curso.png\n---\n");

        let probe = FakeProbe::new(&[("./hero.png", 1200), ("/curso.png", 300)]);
        let err = Collections::load(&ContentStore::new(dir.path()), &probe).unwrap_err();
        let invalid = err.downcast_ref::<InvalidContent>().unwrap();

        assert_eq!(invalid.0.len(), 2);
        assert_eq!(invalid.0[0].collection, CollectionKind::Blog);
        assert_eq!(invalid.0[0].id, "no-title.md");
        assert!(invalid.0[0].to_string().contains("`title` is required"));
        assert_eq!(invalid.0[1].collection, CollectionKind::Store);
        assert!(invalid.0[1].to_string().contains("`custom_link_label` is required"));
    }
}
