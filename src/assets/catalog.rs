//! Static image tables: placeholder slots and the curated scene catalog.

use image::{ImageBuffer, Rgb};

use crate::foundation::error::{ReelError, ReelResult};

/// Generic travel imagery used when no source produced an image for an activity.
pub const PLACEHOLDER_URLS: [&str; 5] = [
    "https://images.unsplash.com/photo-1488646953014-85cb44e25828?w=1920",
    "https://images.unsplash.com/photo-1469854523086-cc02fe5d8800?w=1920",
    "https://images.unsplash.com/photo-1476514525535-07fb3b4ae5f1?w=1920",
    "https://images.unsplash.com/photo-1501785888041-af3ef285b470?w=1920",
    "https://images.unsplash.com/photo-1530789253388-582c481c54b0?w=1920",
];

pub fn placeholder_slot(index: u64) -> usize {
    (index % PLACEHOLDER_URLS.len() as u64) as usize
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scene {
    Beach,
    Mountain,
    City,
    Museum,
    Restaurant,
    Landmark,
    Park,
    Temple,
    Shopping,
    Lake,
}

impl Scene {
    pub const ALL: [Scene; 10] = [
        Scene::Beach,
        Scene::Mountain,
        Scene::City,
        Scene::Museum,
        Scene::Restaurant,
        Scene::Landmark,
        Scene::Park,
        Scene::Temple,
        Scene::Shopping,
        Scene::Lake,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Beach => "beach",
            Self::Mountain => "mountain",
            Self::City => "city",
            Self::Museum => "museum",
            Self::Restaurant => "restaurant",
            Self::Landmark => "landmark",
            Self::Park => "park",
            Self::Temple => "temple",
            Self::Shopping => "shopping",
            Self::Lake => "lake",
        }
    }

    /// Extra words that map onto this scene besides its key.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Beach => &["coast", "shore", "seaside"],
            Self::Mountain => &["hike", "hiking", "trek", "peak"],
            Self::City => &["downtown", "street"],
            Self::Museum => &["gallery", "exhibit"],
            Self::Restaurant => &["dinner", "lunch", "food", "cafe"],
            Self::Landmark => &["monument", "tower", "palace", "castle"],
            Self::Park => &["garden"],
            Self::Temple => &["shrine", "church", "cathedral", "mosque"],
            Self::Shopping => &["market", "bazaar", "mall"],
            Self::Lake => &["river", "lagoon"],
        }
    }

    pub fn urls(self) -> &'static [&'static str] {
        match self {
            Self::Beach => &[
                "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?w=1920",
                "https://images.unsplash.com/photo-1519046904884-53103b34b206?w=1920",
            ],
            Self::Mountain => &[
                "https://images.unsplash.com/photo-1464822759023-fed622ff2c3b?w=1920",
                "https://images.unsplash.com/photo-1454496522488-7a8e488e8606?w=1920",
            ],
            Self::City => &[
                "https://images.unsplash.com/photo-1477959858617-67f85cf4f1df?w=1920",
                "https://images.unsplash.com/photo-1449824913935-59a10b8d2000?w=1920",
            ],
            Self::Museum => &[
                "https://images.unsplash.com/photo-1554907984-15263bfd63bd?w=1920",
                "https://images.unsplash.com/photo-1566127444979-b3d2b654e3d7?w=1920",
            ],
            Self::Restaurant => &[
                "https://images.unsplash.com/photo-1517248135467-4c7edcad34c4?w=1920",
                "https://images.unsplash.com/photo-1414235077428-338989a2e8c0?w=1920",
            ],
            Self::Landmark => &[
                "https://images.unsplash.com/photo-1499856871958-5b9627545d1a?w=1920",
                "https://images.unsplash.com/photo-1513635269975-59663e0ac1ad?w=1920",
            ],
            Self::Park => &[
                "https://images.unsplash.com/photo-1441974231531-c6227db76b6e?w=1920",
                "https://images.unsplash.com/photo-1500534623283-312aade485b7?w=1920",
            ],
            Self::Temple => &[
                "https://images.unsplash.com/photo-1528181304800-259b08848526?w=1920",
                "https://images.unsplash.com/photo-1545569341-9eb8b30979d9?w=1920",
            ],
            Self::Shopping => &[
                "https://images.unsplash.com/photo-1555529669-e69e7aa0ba9a?w=1920",
                "https://images.unsplash.com/photo-1481437156560-3205f6a55735?w=1920",
            ],
            Self::Lake => &[
                "https://images.unsplash.com/photo-1439066615861-d1af74d74000?w=1920",
                "https://images.unsplash.com/photo-1501785888041-af3ef285b470?w=1920",
            ],
        }
    }

    fn matches(self, words: &[&str]) -> bool {
        words
            .iter()
            .any(|w| *w == self.key() || self.aliases().contains(w))
    }
}

fn normalize_key(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect()
}

/// Curated scene lookup keyed by place text, then destination, then a city default.
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneCatalog;

impl SceneCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn lookup(&self, place: &str, destination: &str) -> Scene {
        for text in [place, destination] {
            let norm = normalize_key(text);
            let words: Vec<&str> = norm.split_whitespace().collect();
            if let Some(scene) = Scene::ALL.into_iter().find(|s| s.matches(&words)) {
                return scene;
            }
        }
        Scene::City
    }
}

const LOCAL_PLACEHOLDER_W: u32 = 640;
const LOCAL_PLACEHOLDER_H: u32 = 360;

const SLOT_PALETTE: [([u8; 3], [u8; 3]); 5] = [
    ([32, 58, 96], [222, 160, 92]),
    ([18, 82, 74], [196, 220, 170]),
    ([70, 40, 90], [240, 150, 130]),
    ([30, 70, 110], [150, 200, 230]),
    ([90, 60, 40], [230, 200, 140]),
];

/// PNG bytes of a vertical gradient, a stand-in that never needs the network.
pub fn synthesize_placeholder(slot: usize) -> ReelResult<Vec<u8>> {
    let (top, bottom) = SLOT_PALETTE[slot % SLOT_PALETTE.len()];
    let h = LOCAL_PLACEHOLDER_H;
    let img = ImageBuffer::from_fn(LOCAL_PLACEHOLDER_W, h, |_, y| {
        let t = y as f32 / (h - 1) as f32;
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb([
            mix(top[0], bottom[0]),
            mix(top[1], bottom[1]),
            mix(top[2], bottom[2]),
        ])
    });

    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| ReelError::cache_io(format!("encode placeholder png: {e}")))?;
    Ok(out.into_inner())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/catalog.rs"]
mod tests;
