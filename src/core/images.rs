//! Image insertion under level-3 headings.
//!
//! Each draft has an asset folder under the content root, addressed through
//! the name mapping. The first heading gets the hero image; every later
//! heading gets a random unused image from the rest of the folder.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::ImageSettings;
use crate::domain::document::SECTION_LEVEL;
use crate::domain::{heading_level, NameMapping};

/// Outcome of placing images into a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Document with image references inserted
    pub content: String,

    /// Images used, in insertion order
    pub inserted: Vec<String>,
}

/// Inserts image references using a folder-name lookup table
#[derive(Debug, Clone)]
pub struct ImageInserter {
    root: PathBuf,
    mapping: NameMapping,
    settings: ImageSettings,
}

impl ImageInserter {
    pub fn new(root: impl Into<PathBuf>, mapping: NameMapping, settings: ImageSettings) -> Self {
        Self {
            root: root.into(),
            mapping,
            settings,
        }
    }

    /// Insert images for the draft named `filename`.
    ///
    /// Returns the content unmodified when the draft has no mapping entry or
    /// its asset folder holds no images.
    pub fn insert<R: Rng + ?Sized>(&self, content: &str, filename: &str, rng: &mut R) -> String {
        let Some(folder) = self.mapping.folder_for(filename) else {
            warn!(file = %filename, "No asset folder mapped, skipping image insertion");
            return content.to_string();
        };

        let folder_path = self.root.join(folder);
        let images = list_images(&folder_path, &self.settings.extensions);

        if images.is_empty() {
            warn!(folder = %folder_path.display(), "No images found, skipping image insertion");
            return content.to_string();
        }

        let placement = place_images(content, folder, &images, &self.settings, rng);
        debug!(file = %filename, inserted = placement.inserted.len(), "Inserted images");
        placement.content
    }
}

/// Image files directly inside `folder`, sorted by name
pub fn list_images(folder: &Path, extensions: &[String]) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(folder) else {
        return Vec::new();
    };

    let mut images: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| {
            let lower = name.to_lowercase();
            extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
        })
        .collect();

    images.sort();
    images
}

/// Format an image reference line
pub fn image_reference(settings: &ImageSettings, folder: &str, image: &str) -> String {
    format!("[autoimg]{}/{}/{}[/autoimg]", settings.base_url, folder, image)
}

/// Place one image below each level-3 heading.
///
/// The hero image is used at most once (first heading only) and pool images
/// are never reused. Headings beyond the pool get no image.
pub fn place_images<R: Rng + ?Sized>(
    content: &str,
    folder: &str,
    images: &[String],
    settings: &ImageSettings,
    rng: &mut R,
) -> Placement {
    let has_hero = images.iter().any(|i| *i == settings.hero);
    let mut used: HashSet<&str> = HashSet::new();
    let mut inserted = Vec::new();
    let mut out = String::with_capacity(content.len());
    let mut headings = 0usize;

    for line in content.split_inclusive('\n') {
        out.push_str(line);

        if heading_level(line) != Some(SECTION_LEVEL) {
            continue;
        }
        headings += 1;

        let choice: Option<&str> = if headings == 1 {
            if has_hero {
                Some(settings.hero.as_str())
            } else {
                warn!(folder = %folder, hero = %settings.hero, "Hero image missing, first heading left without image");
                None
            }
        } else {
            let pool: Vec<&str> = images
                .iter()
                .map(String::as_str)
                .filter(|i| *i != settings.hero && !used.contains(i))
                .collect();
            let pick = pool.choose(rng).copied();
            if pick.is_none() {
                warn!(folder = %folder, heading = headings, "Image pool exhausted, heading left without image");
            }
            pick
        };

        let Some(image) = choice else {
            continue;
        };

        used.insert(image);
        inserted.push(image.to_string());

        // Unterminated last line: add no trailing newline
        if line.ends_with('\n') {
            out.push_str(&image_reference(settings, folder, image));
            out.push_str("\n\n");
        } else {
            out.push('\n');
            out.push_str(&image_reference(settings, folder, image));
        }
    }

    Placement {
        content: out,
        inserted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn images(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hero_goes_under_first_heading() {
        let settings = ImageSettings::default();
        let content = "intro\n### One\ntext\n";
        let placement = place_images(
            content,
            "road-mobile",
            &images(&["a.png", "eye.webp"]),
            &settings,
            &mut StdRng::seed_from_u64(1),
        );

        assert_eq!(
            placement.content,
            "intro\n### One\n[autoimg]https://cdn.jsdelivr.net/gh/sensation1220/img/road-mobile/eye.webp[/autoimg]\n\ntext\n"
        );
        assert_eq!(placement.inserted, vec!["eye.webp"]);
    }

    #[test]
    fn test_missing_hero_skips_first_heading() {
        let settings = ImageSettings::default();
        let content = "### One\n### Two\n";
        let placement = place_images(
            content,
            "f",
            &images(&["a.png"]),
            &settings,
            &mut StdRng::seed_from_u64(1),
        );

        assert_eq!(placement.inserted, vec!["a.png"]);
        assert!(placement.content.starts_with("### One\n### Two\n[autoimg]"));
    }

    #[test]
    fn test_level_four_headings_ignored() {
        let settings = ImageSettings::default();
        let content = "#### Deep\n## Shallow\n";
        let placement = place_images(
            content,
            "f",
            &images(&["eye.webp", "a.png"]),
            &settings,
            &mut StdRng::seed_from_u64(1),
        );

        assert!(placement.inserted.is_empty());
        assert_eq!(placement.content, content);
    }

    #[test]
    fn test_heading_on_last_line_without_newline() {
        let settings = ImageSettings::default();
        let placement = place_images(
            "### Only",
            "f",
            &images(&["eye.webp"]),
            &settings,
            &mut StdRng::seed_from_u64(1),
        );

        assert_eq!(
            placement.content,
            format!("### Only\n{}", image_reference(&settings, "f", "eye.webp"))
        );
        assert!(!placement.content.ends_with('\n'));
    }

    #[test]
    fn test_list_images_filters_extensions() {
        let temp = tempfile::TempDir::new().unwrap();
        for name in ["b.JPG", "a.webp", "notes.txt", ".DS_Store", "c.gif"] {
            std::fs::write(temp.path().join(name), "").unwrap();
        }
        std::fs::create_dir(temp.path().join("sub.png")).unwrap();

        let found = list_images(temp.path(), &ImageSettings::default().extensions);
        assert_eq!(found, vec!["a.webp", "b.JPG", "c.gif"]);
    }
}
