use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("skeleton version {value} does not match any supported version")]
    UnsupportedVersion { value: String },

    #[error("skin not found: {name}")]
    SkinNotFound { name: String },

    #[error("parent mesh not found: {name}")]
    ParentMeshNotFound { name: String },

    #[error("attachment not found: {name}")]
    AttachmentNotFound { name: String },

    #[cfg(feature = "binary")]
    #[error("failed to parse skeleton binary: {message}")]
    BinaryParse { message: String },

    #[cfg(feature = "json")]
    #[error("failed to parse skeleton JSON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("invalid skeleton JSON data: missing header")]
    JsonMissingHeader,

    #[cfg(feature = "json")]
    #[error("invalid color '{value}' for {context}")]
    JsonInvalidColor { context: String, value: String },

    #[cfg(feature = "json")]
    #[error("invalid curve for {context}: {message}")]
    JsonInvalidCurve { context: String, message: String },

    #[cfg(feature = "json")]
    #[error("unknown parent bone '{parent}' for bone '{bone}'")]
    JsonUnknownBoneParent { bone: String, parent: String },

    #[cfg(feature = "json")]
    #[error("unknown bone '{bone}' referenced by slot '{slot}'")]
    JsonUnknownSlotBone { slot: String, bone: String },

    #[cfg(feature = "json")]
    #[error("unknown {kind} '{referenced}' referenced by constraint '{constraint}'")]
    JsonUnknownConstraintRef {
        constraint: String,
        kind: String,
        referenced: String,
    },

    #[cfg(feature = "json")]
    #[error("unknown slot '{slot}' referenced by skin '{skin}'")]
    JsonUnknownSkinSlot { skin: String, slot: String },

    #[cfg(feature = "json")]
    #[error("unknown bone '{bone}' referenced by skin '{skin}'")]
    JsonUnknownSkinBone { skin: String, bone: String },

    #[cfg(feature = "json")]
    #[error("unknown {kind} constraint '{constraint}' referenced by skin '{skin}'")]
    JsonUnknownSkinConstraint {
        skin: String,
        kind: String,
        constraint: String,
    },

    #[cfg(feature = "json")]
    #[error(
        "unsupported attachment type '{attachment_type}' for skin '{skin}', slot '{slot}', attachment '{attachment}'"
    )]
    JsonUnsupportedAttachmentType {
        skin: String,
        slot: String,
        attachment: String,
        attachment_type: String,
    },

    #[cfg(feature = "json")]
    #[error(
        "invalid attachment data for skin '{skin}', slot '{slot}', attachment '{attachment}': {message}"
    )]
    JsonInvalidAttachmentData {
        skin: String,
        slot: String,
        attachment: String,
        message: String,
    },

    #[cfg(feature = "json")]
    #[error("unknown slot '{slot}' referenced by animation '{animation}'")]
    JsonUnknownAnimationSlot { animation: String, slot: String },

    #[cfg(feature = "json")]
    #[error("unknown bone '{bone}' referenced by animation '{animation}'")]
    JsonUnknownAnimationBone { animation: String, bone: String },

    #[cfg(feature = "json")]
    #[error("unknown {kind} constraint '{constraint}' referenced by animation '{animation}'")]
    JsonUnknownConstraintTimeline {
        animation: String,
        kind: String,
        constraint: String,
    },

    #[cfg(feature = "json")]
    #[error("unknown event '{event}' referenced by animation '{animation}'")]
    JsonUnknownEvent { animation: String, event: String },

    #[cfg(feature = "json")]
    #[error("invalid drawOrder data for animation '{animation}': {message}")]
    JsonInvalidDrawOrder { animation: String, message: String },

    #[cfg(feature = "json")]
    #[error("unknown skin '{skin}' referenced by attachment timeline in animation '{animation}'")]
    JsonUnknownTimelineSkin { animation: String, skin: String },
}
