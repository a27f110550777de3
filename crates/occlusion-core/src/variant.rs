//! Shader permutation selection.
//!
//! Every configuration axis maps to exactly one tag. The five tags together
//! form a [`VariantKey`], and a [`PermutationTable`] built once up front maps
//! each key to a dense [`PermutationId`] that backends can use to cache
//! specialised programs.

use std::collections::HashMap;

use crate::settings::{
    Algorithm, BlurWidth, DebugMode, NormalReconstruction, OcclusionSettings, Quality,
};

/// Algorithm axis tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmTag {
    Hbao,
    Gtao,
    Sao,
}

impl AlgorithmTag {
    pub const ALL: [Self; 3] = [Self::Hbao, Self::Gtao, Self::Sao];

    /// Keyword naming this tag in shader sources.
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            Self::Hbao => "HORIZON_BASED_AMBIENTOCCLUSION",
            Self::Gtao => "GROUNDTRUTH_BASED_AMBIENTOCCLUSION",
            Self::Sao => "SCALABLE_AMBIENT_OBSCURANCE",
        })
    }
}

/// Sample density axis tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityTag {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

impl QualityTag {
    pub const ALL: [Self; 5] = [
        Self::Lowest,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Highest,
    ];

    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            Self::Lowest => "QUALITY_LOWEST",
            Self::Low => "QUALITY_LOW",
            Self::Medium => "QUALITY_MEDIUM",
            Self::High => "QUALITY_HIGH",
            Self::Highest => "QUALITY_HIGHEST",
        })
    }

    /// Horizon directions and steps per direction sampled at this density.
    pub fn sample_counts(self) -> (u32, u32) {
        match self {
            Self::Lowest => (3, 2),
            Self::Low => (4, 3),
            Self::Medium => (4, 4),
            Self::High => (6, 4),
            Self::Highest => (8, 6),
        }
    }
}

/// Blur radius axis tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlurTag {
    Radius2,
    Radius3,
    Radius4,
    Radius5,
}

impl BlurTag {
    pub const ALL: [Self; 4] = [Self::Radius2, Self::Radius3, Self::Radius4, Self::Radius5];

    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            Self::Radius2 => "BLUR_RADIUS_2",
            Self::Radius3 => "BLUR_RADIUS_3",
            Self::Radius4 => "BLUR_RADIUS_4",
            Self::Radius5 => "BLUR_RADIUS_5",
        })
    }

    /// Kernel radius in texels.
    pub fn radius(self) -> u32 {
        match self {
            Self::Radius2 => 2,
            Self::Radius3 => 3,
            Self::Radius4 => 4,
            Self::Radius5 => 5,
        }
    }
}

/// Normal reconstruction axis tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalTag {
    /// Read normals from the host's normal buffer.
    None,
    Low,
    Medium,
    High,
}

impl NormalTag {
    pub const ALL: [Self; 4] = [Self::None, Self::Low, Self::Medium, Self::High];

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Low => Some("RECONSTRUCT_NORMAL_LOW"),
            Self::Medium => Some("RECONSTRUCT_NORMAL_MEDIUM"),
            Self::High => Some("RECONSTRUCT_NORMAL_HIGH"),
        }
    }
}

/// Debug axis tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugTag {
    None,
    Ao,
    ViewNormal,
}

impl DebugTag {
    pub const ALL: [Self; 3] = [Self::None, Self::Ao, Self::ViewNormal];

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Ao => Some("DEBUG_AO"),
            Self::ViewNormal => Some("DEBUG_VIEWNORMAL"),
        }
    }
}

/// One tag per configuration axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub algorithm: AlgorithmTag,
    pub quality: QualityTag,
    pub blur: BlurTag,
    pub normals: NormalTag,
    pub debug: DebugTag,
}

impl VariantKey {
    /// Maps each settings axis to its tag.
    pub fn from_settings(settings: &OcclusionSettings) -> Self {
        Self {
            algorithm: match settings.algorithm {
                Algorithm::HorizonBased => AlgorithmTag::Hbao,
                Algorithm::GroundTruthBased => AlgorithmTag::Gtao,
                Algorithm::ScalableObscurance => AlgorithmTag::Sao,
            },
            quality: match settings.quality {
                Quality::Lowest => QualityTag::Lowest,
                Quality::Low => QualityTag::Low,
                Quality::Medium => QualityTag::Medium,
                Quality::High => QualityTag::High,
                Quality::Highest => QualityTag::Highest,
            },
            // No blur pass is issued for `None`; the tag still has to be set.
            blur: match settings.blur {
                BlurWidth::X2 => BlurTag::Radius2,
                BlurWidth::None | BlurWidth::X3 => BlurTag::Radius3,
                BlurWidth::X4 => BlurTag::Radius4,
                BlurWidth::X5 => BlurTag::Radius5,
            },
            normals: match settings.reconstruct_normal {
                NormalReconstruction::Disabled => NormalTag::None,
                NormalReconstruction::Low => NormalTag::Low,
                NormalReconstruction::Medium => NormalTag::Medium,
                NormalReconstruction::High => NormalTag::High,
            },
            debug: match settings.debug_mode {
                DebugMode::Disabled => DebugTag::None,
                DebugMode::AoOnly => DebugTag::Ao,
                DebugMode::ViewNormal => DebugTag::ViewNormal,
            },
        }
    }

    /// Keywords of all non-no-op tags, in axis order.
    pub fn keywords(&self) -> Vec<&'static str> {
        [
            self.algorithm.keyword(),
            self.quality.keyword(),
            self.blur.keyword(),
            self.normals.keyword(),
            self.debug.keyword(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Opaque identifier of one shader permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermutationId(u16);

impl PermutationId {
    /// Dense index of this permutation, usable as an array index.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Read-only map between every valid [`VariantKey`] and its [`PermutationId`].
#[derive(Debug, Clone)]
pub struct PermutationTable {
    ids: HashMap<VariantKey, PermutationId>,
    keys: Vec<VariantKey>,
}

impl PermutationTable {
    /// Enumerates the full cross product of all axes.
    pub fn new() -> Self {
        let mut keys = Vec::with_capacity(
            AlgorithmTag::ALL.len()
                * QualityTag::ALL.len()
                * BlurTag::ALL.len()
                * NormalTag::ALL.len()
                * DebugTag::ALL.len(),
        );
        for algorithm in AlgorithmTag::ALL {
            for quality in QualityTag::ALL {
                for blur in BlurTag::ALL {
                    for normals in NormalTag::ALL {
                        for debug in DebugTag::ALL {
                            keys.push(VariantKey {
                                algorithm,
                                quality,
                                blur,
                                normals,
                                debug,
                            });
                        }
                    }
                }
            }
        }

        let ids = keys
            .iter()
            .enumerate()
            .map(|(index, key)| {
                let id = u16::try_from(index).unwrap_or(u16::MAX);
                (*key, PermutationId(id))
            })
            .collect();

        Self { ids, keys }
    }

    /// Number of permutations.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Looks up the identifier of a key.
    pub fn id(&self, key: &VariantKey) -> Option<PermutationId> {
        self.ids.get(key).copied()
    }

    /// Looks up the key behind an identifier.
    pub fn key(&self, id: PermutationId) -> Option<&VariantKey> {
        self.keys.get(id.index())
    }
}

impl Default for PermutationTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The variant chosen for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveVariant {
    pub key: VariantKey,
    pub id: PermutationId,
}

/// Maps settings to the active permutation, recomputed every frame.
#[derive(Debug, Clone, Default)]
pub struct VariantSelector {
    table: PermutationTable,
    last: Option<PermutationId>,
}

impl VariantSelector {
    pub fn new() -> Self {
        Self {
            table: PermutationTable::new(),
            last: None,
        }
    }

    /// Returns the permutation table backing this selector.
    pub fn table(&self) -> &PermutationTable {
        &self.table
    }

    /// Selects the variant for the given settings.
    pub fn select(&mut self, settings: &OcclusionSettings) -> ActiveVariant {
        let key = VariantKey::from_settings(settings);
        // The table holds the full cross product, so every key is present.
        let id = self.table.id(&key).unwrap_or(PermutationId(0));
        if self.last != Some(id) {
            log::debug!("occlusion variant changed: {:?}", key.keywords());
            self.last = Some(id);
        }
        ActiveVariant { key, id }
    }
}
