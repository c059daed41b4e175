pub mod align;
pub mod differ;
pub mod raster;
pub mod regions;
pub mod render;
pub mod score;

use image::RgbaImage;
use thiserror::Error;
use tracing::debug;

use self::differ::Offset;
use self::regions::BoundaryRect;
use self::render::OverlayColors;

/// A comparison that could not be performed at all. Distinct from a FAIL
/// verdict, which is a comparison that ran and found a difference.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("failed to decode {role} image")]
    ImageDecode {
        role: &'static str,
        #[source]
        source: image::ImageError,
    },
}

/// Knobs the engine honors for a single comparison.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Failure threshold in percent. Composites above it fail.
    pub max_difference: f64,
    /// Run the alignment search instead of assuming offset (0, 0).
    pub reposition: bool,
    pub colors: OverlayColors,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            max_difference: 0.01,
            reposition: false,
            colors: OverlayColors::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// Outcome of one comparison. Constructed once, immutable afterwards.
#[derive(Debug)]
pub struct ComparisonResult {
    /// Composite difference in percent, unrounded.
    pub composite: f64,
    pub verdict: Verdict,
    /// Reference placement used for differencing and rendering.
    pub offset: Offset,
    /// Difference regions in discovery order: content regions first, then
    /// size strips. Empty when the composite is zero.
    pub regions: Vec<BoundaryRect>,
    /// `Some((ref_w, ref_h, cand_w, cand_h))` when canvas dimensions differ.
    pub dimension_mismatch: Option<(u32, u32, u32, u32)>,
    /// Annotated diff artifact, rendered only for failing comparisons.
    pub diff_image: Option<RgbaImage>,
}

impl ComparisonResult {
    /// Composite rounded to two decimals for presentation.
    pub fn percentage(&self) -> f64 {
        score::round2(self.composite)
    }

    fn identical() -> Self {
        Self {
            composite: 0.0,
            verdict: Verdict::Pass,
            offset: Offset::ZERO,
            regions: Vec::new(),
            dimension_mismatch: None,
            diff_image: None,
        }
    }
}

/// Per-snapshot status as the check command reports it.
pub enum CheckStatus {
    Pass {
        percentage: f64,
    },
    Fail {
        percentage: f64,
        regions: usize,
        dimension_mismatch: Option<(u32, u32, u32, u32)>,
    },
    /// No reference existed; the candidate seeded one.
    New,
    Error(String),
}

/// Compare a candidate screenshot against its reference.
///
/// Two-phase, like every comparison here: a byte-identical check first,
/// then decode and the full pipeline — optional alignment search, pixel
/// differencing, size-strip derivation, scoring, and (for failures) the
/// rendered artifact. Stateless; both decoded buffers are dropped with the
/// returned result.
pub fn compare(
    reference_png: &[u8],
    candidate_png: &[u8],
    opts: &DiffOptions,
) -> Result<ComparisonResult, CompareError> {
    if reference_png == candidate_png {
        return Ok(ComparisonResult::identical());
    }

    let reference = raster::decode(reference_png).map_err(|source| CompareError::ImageDecode {
        role: "reference",
        source,
    })?;
    let candidate = raster::decode(candidate_png).map_err(|source| CompareError::ImageDecode {
        role: "candidate",
        source,
    })?;

    let dimension_mismatch = (reference.dimensions() != candidate.dimensions()).then(|| {
        (
            reference.width(),
            reference.height(),
            candidate.width(),
            candidate.height(),
        )
    });

    let offset = if opts.reposition {
        align::best_offset(&candidate, &reference)
    } else {
        Offset::ZERO
    };

    let diff = differ::difference(&candidate, &reference, offset);
    let size_rects = regions::size_regions(candidate.dimensions(), reference.dimensions(), offset);
    let score = score::score(
        diff.aggregate,
        &size_rects,
        (diff.mask.width(), diff.mask.height()),
    );

    debug!(
        area_diff = score.area_diff,
        content_diff = score.content_diff,
        dx = offset.dx,
        dy = offset.dy,
        "scored comparison"
    );

    let verdict = if score.composite > opts.max_difference {
        Verdict::Fail
    } else {
        Verdict::Pass
    };

    let mut rects = Vec::new();
    if score.composite > 0.0 {
        rects = regions::merge_mask(&diff.mask);
        debug!(
            content_regions = rects.len(),
            changed_pixels = diff.mask.marked_count(),
            region_area = rects.iter().map(|r| r.area()).sum::<u64>(),
            "grouped difference regions"
        );
        rects.extend(size_rects);
    }

    let diff_image = (verdict == Verdict::Fail)
        .then(|| render::render(&candidate, &reference, offset, &rects, &opts.colors));

    Ok(ComparisonResult {
        composite: score.composite,
        verdict,
        offset,
        regions: rects,
        dimension_mismatch,
        diff_image,
    })
}
