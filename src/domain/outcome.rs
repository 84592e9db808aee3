//! Final result of relaying one link.

/// Result of one link's full pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The media was uploaded to the chat
    Delivered { extension: &'static str, size_bytes: u64 },

    /// The media exceeds the size ceiling; the direct URL is offered instead
    TooLarge { direct_url: String },

    /// The resolver could not produce media
    ResolutionFailed { reason: String },

    /// The resolver answered but no usable media URL was present
    NoMediaFound,

    /// Fetching or staging the media failed
    TransferFailed { reason: String },

    /// The media was staged but the upload to the chat failed
    DeliveryFailed { reason: String },
}
