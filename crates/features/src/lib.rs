//! Feature extraction: turns post text and metadata into a fixed-length,
//! versioned numeric vector shared with the regression predictor.

pub mod extractor;
pub mod features;
pub mod text;
pub mod vocab;

pub use extractor::{extract, extract_at};
pub use features::{
    feature_index, feature_names, features_to_array, ContentFeatures, FEATURE_COUNT,
    FEATURE_NAMES, FEATURE_VERSION,
};
