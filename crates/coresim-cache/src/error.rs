//! Cache geometry configuration errors.

/// Errors raised while constructing a [`crate::geometry::CacheGeometry`].
///
/// These are configuration errors: their root cause is CLI input (`-s`,
/// `-E`, `-b`), not a bug in the simulator itself.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeometryError {
    /// A geometry field that must be a power of two was not one.
    #[error("{field} must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Name of the offending field (`block_size_bytes` or `num_sets`).
        field: &'static str,
        /// The value that was supplied.
        value: u32,
    },

    /// `set_index_bits + block_offset_bits` exceeded the 32-bit address
    /// width, leaving no room for a tag.
    #[error("set_index_bits + block_offset_bits must be less than 32")]
    TagBitsUnderflow,
}
