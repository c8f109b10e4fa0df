//! JSON loaders.
//!
//! Documents deserialize into permissive `Def` structs first (absorbing the
//! key spellings of every supported export version), then a version-specific
//! reader resolves names to indices and builds the output graph. Dispatch
//! happens once, on the `skeleton.spine` version string.

mod v38;
mod v4x;

use crate::{
    AttachmentData, BlendMode, BoneData, BoundingBoxAttachmentData, ClippingAttachmentData, Curve,
    Error, EventData, FormatVersion, Inherit, MeshAttachmentData, PathAttachmentData,
    PointAttachmentData, PositionMode, RegionAttachmentData, RotateMode, SequenceDef,
    SequenceMode, SkeletonData, SkinData, SlotData, SpacingMode, VertexWeight, Vertices,
};
use serde::Deserialize;
use std::collections::HashMap;

fn default_one() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_one_i32() -> i32 {
    1
}

fn default_reference_scale() -> f32 {
    100.0
}

fn default_fps() -> f32 {
    30.0
}

#[derive(Debug, Deserialize)]
pub(crate) struct Root {
    skeleton: Option<SkeletonHeaderDef>,
    #[serde(default)]
    bones: Vec<BoneDef>,
    #[serde(default)]
    slots: Vec<SlotDef>,
    #[serde(default)]
    ik: Vec<IkConstraintDef>,
    #[serde(default)]
    transform: Vec<TransformConstraintDef>,
    #[serde(default)]
    path: Vec<PathConstraintDef>,
    #[serde(default)]
    physics: Vec<PhysicsConstraintDef>,
    skins: Option<SkinsDef>,
    #[serde(default)]
    events: indexmap_like::OrderedMap<EventDef>,
    #[serde(default)]
    animations: indexmap_like::OrderedMap<AnimationDef>,
}

// `serde_json` maps lose document order unless told otherwise; events and
// animations are index-addressed by the binary format and name-addressed
// here, but keeping document order makes the two loaders agree.
mod indexmap_like {
    use serde::{Deserialize, Deserializer};

    #[derive(Debug)]
    pub(crate) struct OrderedMap<T>(pub Vec<(String, T)>);

    impl<T> Default for OrderedMap<T> {
        fn default() -> Self {
            Self(Vec::new())
        }
    }

    impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedMap<T> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct Visitor<T>(std::marker::PhantomData<T>);

            impl<'de, T: Deserialize<'de>> serde::de::Visitor<'de> for Visitor<T> {
                type Value = OrderedMap<T>;

                fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str("a map")
                }

                fn visit_map<A: serde::de::MapAccess<'de>>(
                    self,
                    mut access: A,
                ) -> Result<Self::Value, A::Error> {
                    let mut entries = Vec::new();
                    while let Some((key, value)) = access.next_entry::<String, T>()? {
                        entries.push((key, value));
                    }
                    Ok(OrderedMap(entries))
                }
            }

            deserializer.deserialize_map(Visitor(std::marker::PhantomData))
        }
    }
}

#[derive(Debug, Deserialize)]
struct SkeletonHeaderDef {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    spine: Option<String>,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default = "default_reference_scale", rename = "referenceScale")]
    reference_scale: f32,
    #[serde(default = "default_fps")]
    fps: f32,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    images: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BoneDef {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    length: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default = "default_one", rename = "scaleX")]
    scale_x: f32,
    #[serde(default = "default_one", rename = "scaleY")]
    scale_y: f32,
    #[serde(default, rename = "shearX")]
    shear_x: f32,
    #[serde(default, rename = "shearY")]
    shear_y: f32,
    // 3.8 exports spell this "transform".
    #[serde(default, alias = "transform")]
    inherit: Option<String>,
    #[serde(default, rename = "skin")]
    skin_required: bool,
    #[serde(default)]
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlotDef {
    name: String,
    bone: String,
    #[serde(default)]
    attachment: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    dark: Option<String>,
    #[serde(default)]
    blend: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IkConstraintDef {
    name: String,
    #[serde(default)]
    order: i32,
    #[serde(default, rename = "skin")]
    skin_required: bool,
    #[serde(default)]
    bones: Vec<String>,
    target: String,
    #[serde(default = "default_one")]
    mix: f32,
    #[serde(default)]
    softness: f32,
    #[serde(default = "default_true", rename = "bendPositive")]
    bend_positive: bool,
    #[serde(default)]
    compress: bool,
    #[serde(default)]
    stretch: bool,
    #[serde(default)]
    uniform: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransformConstraintDef {
    name: String,
    #[serde(default)]
    order: i32,
    #[serde(default, rename = "skin")]
    skin_required: bool,
    #[serde(default)]
    bones: Vec<String>,
    target: String,
    #[serde(default)]
    local: bool,
    #[serde(default)]
    relative: bool,
    #[serde(default)]
    rotation: f32,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default, rename = "scaleX")]
    scale_x: f32,
    #[serde(default, rename = "scaleY")]
    scale_y: f32,
    #[serde(default, rename = "shearY")]
    shear_y: f32,

    // 4.x mixes.
    #[serde(default, rename = "mixRotate")]
    mix_rotate: Option<f32>,
    #[serde(default, rename = "mixX")]
    mix_x: Option<f32>,
    #[serde(default, rename = "mixY")]
    mix_y: Option<f32>,
    #[serde(default, rename = "mixScaleX")]
    mix_scale_x: Option<f32>,
    #[serde(default, rename = "mixScaleY")]
    mix_scale_y: Option<f32>,
    #[serde(default, rename = "mixShearY")]
    mix_shear_y: Option<f32>,

    // 3.8 mixes; translate and scale broadcast to their x/y pairs.
    #[serde(default, rename = "rotateMix")]
    rotate_mix: Option<f32>,
    #[serde(default, rename = "translateMix")]
    translate_mix: Option<f32>,
    #[serde(default, rename = "scaleMix")]
    scale_mix: Option<f32>,
    #[serde(default, rename = "shearMix")]
    shear_mix: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PathConstraintDef {
    name: String,
    #[serde(default)]
    order: i32,
    #[serde(default, rename = "skin")]
    skin_required: bool,
    #[serde(default)]
    bones: Vec<String>,
    target: String,
    #[serde(default, rename = "positionMode")]
    position_mode: Option<String>,
    #[serde(default, rename = "spacingMode")]
    spacing_mode: Option<String>,
    #[serde(default, rename = "rotateMode")]
    rotate_mode: Option<String>,
    #[serde(default)]
    rotation: f32,
    #[serde(default)]
    position: f32,
    #[serde(default)]
    spacing: f32,

    // 4.x mixes.
    #[serde(default, rename = "mixRotate")]
    mix_rotate: Option<f32>,
    #[serde(default, rename = "mixX")]
    mix_x: Option<f32>,
    #[serde(default, rename = "mixY")]
    mix_y: Option<f32>,

    // 3.8 mixes.
    #[serde(default, rename = "rotateMix")]
    rotate_mix: Option<f32>,
    #[serde(default, rename = "translateMix")]
    translate_mix: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhysicsConstraintDef {
    name: String,
    #[serde(default)]
    order: i32,
    #[serde(default, rename = "skin")]
    skin_required: bool,
    bone: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    rotate: f32,
    #[serde(default, rename = "scaleX")]
    scale_x: f32,
    #[serde(default, rename = "shearX")]
    shear_x: f32,
    #[serde(default)]
    limit: Option<f32>,
    #[serde(default)]
    fps: Option<f32>,
    #[serde(default)]
    inertia: Option<f32>,
    #[serde(default)]
    strength: Option<f32>,
    #[serde(default)]
    damping: Option<f32>,
    #[serde(default)]
    mass: Option<f32>,
    #[serde(default)]
    wind: Option<f32>,
    #[serde(default)]
    gravity: Option<f32>,
    #[serde(default)]
    mix: Option<f32>,
    #[serde(default, rename = "inertiaGlobal")]
    inertia_global: bool,
    #[serde(default, rename = "strengthGlobal")]
    strength_global: bool,
    #[serde(default, rename = "dampingGlobal")]
    damping_global: bool,
    #[serde(default, rename = "massGlobal")]
    mass_global: bool,
    #[serde(default, rename = "windGlobal")]
    wind_global: bool,
    #[serde(default, rename = "gravityGlobal")]
    gravity_global: bool,
    #[serde(default, rename = "mixGlobal")]
    mix_global: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkinsDef {
    Array(Vec<SkinDef>),
    // Pre-3.8 documents keyed skins by name; kept for leniency.
    Map(indexmap_like::OrderedMap<HashMap<String, HashMap<String, AttachmentDef>>>),
}

#[derive(Debug, Deserialize)]
struct SkinDef {
    name: String,
    #[serde(default)]
    attachments: HashMap<String, HashMap<String, AttachmentDef>>,
    #[serde(default)]
    bones: Vec<String>,
    #[serde(default)]
    ik: Vec<String>,
    #[serde(default)]
    transform: Vec<String>,
    #[serde(default)]
    path: Vec<String>,
    #[serde(default)]
    physics: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentDef {
    #[serde(default, rename = "type")]
    attachment_type: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "default_one", rename = "scaleX")]
    scale_x: f32,
    #[serde(default = "default_one", rename = "scaleY")]
    scale_y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    sequence: Option<SequenceDefJson>,

    #[serde(default)]
    uvs: Vec<f32>,
    #[serde(default)]
    triangles: Vec<u16>,
    #[serde(default)]
    vertices: Vec<f32>,
    #[serde(default)]
    hull: usize,
    #[serde(default)]
    edges: Vec<u16>,

    // Linked mesh fields; 3.8 spells the inherit flag "deform".
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    skin: Option<String>,
    #[serde(default, alias = "deform")]
    timelines: Option<bool>,

    #[serde(default)]
    closed: bool,
    #[serde(default = "default_true", rename = "constantSpeed")]
    constant_speed: bool,
    #[serde(default, rename = "vertexCount")]
    vertex_count: usize,
    #[serde(default)]
    lengths: Vec<f32>,

    #[serde(default)]
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SequenceDefJson {
    count: usize,
    #[serde(default = "default_one_i32")]
    start: i32,
    #[serde(default)]
    digits: usize,
    #[serde(default, rename = "setup")]
    setup_index: i32,
}

#[derive(Debug, Deserialize, Default)]
struct EventDef {
    #[serde(default, rename = "int")]
    int_value: i32,
    #[serde(default, rename = "float")]
    float_value: f32,
    #[serde(default, rename = "string")]
    string_value: String,
    #[serde(default, rename = "audio")]
    audio_path: String,
    #[serde(default = "default_one")]
    volume: f32,
    #[serde(default)]
    balance: f32,
}

// Animation defs are shared by every version; each reader consumes the keys
// its format defines and ignores the rest.

#[derive(Debug, Deserialize)]
pub(crate) struct AnimationDef {
    #[serde(default)]
    slots: indexmap_like::OrderedMap<SlotAnimDef>,
    #[serde(default)]
    bones: indexmap_like::OrderedMap<BoneAnimDef>,
    #[serde(default)]
    ik: indexmap_like::OrderedMap<Vec<IkKey>>,
    #[serde(default)]
    transform: indexmap_like::OrderedMap<Vec<TransformKey>>,
    // "paths" in 3.8, "path" from 4.0.
    #[serde(default, alias = "paths")]
    path: indexmap_like::OrderedMap<indexmap_like::OrderedMap<Vec<PathKey>>>,
    #[serde(default)]
    physics: indexmap_like::OrderedMap<indexmap_like::OrderedMap<Vec<PhysicsKey>>>,
    // "deform" in 3.8, "attachments" from 4.0.
    #[serde(default, alias = "deform")]
    attachments: indexmap_like::OrderedMap<
        indexmap_like::OrderedMap<indexmap_like::OrderedMap<AttachmentAnimDef>>,
    >,
    #[serde(default, rename = "drawOrder", alias = "draworder")]
    draw_order: Vec<DrawOrderKey>,
    #[serde(default)]
    events: Vec<EventKey>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct SlotAnimDef {
    #[serde(default)]
    attachment: Vec<AttachmentKey>,
    // 3.8 one-color / two-color timelines.
    #[serde(default)]
    color: Vec<ColorKey>,
    #[serde(default, rename = "twoColor")]
    two_color: Vec<TwoColorKey>,
    // 4.x color timelines.
    #[serde(default)]
    rgba: Vec<ColorKey>,
    #[serde(default)]
    rgb: Vec<ColorKey>,
    #[serde(default)]
    alpha: Vec<FloatKey>,
    #[serde(default)]
    rgba2: Vec<TwoColorKey>,
    #[serde(default)]
    rgb2: Vec<TwoColorKey>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct BoneAnimDef {
    #[serde(default)]
    rotate: Vec<RotateKey>,
    #[serde(default)]
    translate: Vec<Vec2Key>,
    #[serde(default, rename = "translatex", alias = "translateX")]
    translate_x: Vec<FloatKey>,
    #[serde(default, rename = "translatey", alias = "translateY")]
    translate_y: Vec<FloatKey>,
    #[serde(default)]
    scale: Vec<Vec2Key>,
    #[serde(default, rename = "scalex", alias = "scaleX")]
    scale_x: Vec<FloatKey>,
    #[serde(default, rename = "scaley", alias = "scaleY")]
    scale_y: Vec<FloatKey>,
    #[serde(default)]
    shear: Vec<Vec2Key>,
    #[serde(default, rename = "shearx", alias = "shearX")]
    shear_x: Vec<FloatKey>,
    #[serde(default, rename = "sheary", alias = "shearY")]
    shear_y: Vec<FloatKey>,
    #[serde(default)]
    inherit: Vec<InheritKey>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttachmentKey {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ColorKey {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    color: Option<String>,
    #[serde(flatten)]
    curve: CurveKey,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TwoColorKey {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    light: Option<String>,
    #[serde(default)]
    dark: Option<String>,
    #[serde(flatten)]
    curve: CurveKey,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FloatKey {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    value: Option<f32>,
    #[serde(flatten)]
    curve: CurveKey,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RotateKey {
    #[serde(default)]
    time: f32,
    // "angle" in 3.8, "value" from 4.0.
    #[serde(default)]
    angle: Option<f32>,
    #[serde(default)]
    value: Option<f32>,
    #[serde(flatten)]
    curve: CurveKey,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Vec2Key {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    x: Option<f32>,
    #[serde(default)]
    y: Option<f32>,
    #[serde(flatten)]
    curve: CurveKey,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InheritKey {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    inherit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IkKey {
    #[serde(default)]
    time: f32,
    #[serde(default = "default_one")]
    mix: f32,
    #[serde(default)]
    softness: f32,
    #[serde(default = "default_true", rename = "bendPositive")]
    bend_positive: bool,
    #[serde(default)]
    compress: bool,
    #[serde(default)]
    stretch: bool,
    #[serde(flatten)]
    curve: CurveKey,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransformKey {
    #[serde(default)]
    time: f32,
    #[serde(default, rename = "mixRotate")]
    mix_rotate: Option<f32>,
    #[serde(default, rename = "mixX")]
    mix_x: Option<f32>,
    #[serde(default, rename = "mixY")]
    mix_y: Option<f32>,
    #[serde(default, rename = "mixScaleX")]
    mix_scale_x: Option<f32>,
    #[serde(default, rename = "mixScaleY")]
    mix_scale_y: Option<f32>,
    #[serde(default, rename = "mixShearY")]
    mix_shear_y: Option<f32>,
    #[serde(default, rename = "rotateMix")]
    rotate_mix: Option<f32>,
    #[serde(default, rename = "translateMix")]
    translate_mix: Option<f32>,
    #[serde(default, rename = "scaleMix")]
    scale_mix: Option<f32>,
    #[serde(default, rename = "shearMix")]
    shear_mix: Option<f32>,
    #[serde(flatten)]
    curve: CurveKey,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PathKey {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    value: Option<f32>,
    #[serde(default)]
    position: Option<f32>,
    #[serde(default)]
    spacing: Option<f32>,
    #[serde(default, rename = "mixRotate")]
    mix_rotate: Option<f32>,
    #[serde(default, rename = "mixX")]
    mix_x: Option<f32>,
    #[serde(default, rename = "mixY")]
    mix_y: Option<f32>,
    #[serde(default, rename = "rotateMix")]
    rotate_mix: Option<f32>,
    #[serde(default, rename = "translateMix")]
    translate_mix: Option<f32>,
    #[serde(flatten)]
    curve: CurveKey,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhysicsKey {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    value: Option<f32>,
    #[serde(flatten)]
    curve: CurveKey,
}

/// Per-attachment animation value: 3.8 nests the deform key array directly
/// under the attachment name; 4.x wraps it in `{ "deform": ..., "sequence":
/// ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AttachmentAnimDef {
    Timelines {
        #[serde(default)]
        deform: Vec<DeformKey>,
        #[serde(default)]
        sequence: Vec<SequenceKey>,
    },
    Direct(Vec<DeformKey>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeformKey {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    vertices: Vec<f32>,
    #[serde(flatten)]
    curve: CurveKey,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SequenceKey {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    index: i32,
    #[serde(default)]
    delay: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DrawOrderKey {
    #[serde(default)]
    time: f32,
    #[serde(default)]
    offsets: Vec<DrawOrderOffset>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DrawOrderOffset {
    slot: String,
    #[serde(default)]
    offset: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventKey {
    #[serde(default)]
    time: f32,
    name: String,
    #[serde(default, rename = "int")]
    int_value: Option<i32>,
    #[serde(default, rename = "float")]
    float_value: Option<f32>,
    #[serde(default, rename = "string")]
    string_value: Option<String>,
    #[serde(default)]
    volume: Option<f32>,
    #[serde(default)]
    balance: Option<f32>,
}

/// Raw curve value: 3.8 writes `"stepped"`, a bare `cx1` number (with
/// sibling `c2`..`c4` keys) or a four-float array; 4.x writes `"stepped"` or
/// a flat array of four floats per value channel.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct CurveKey {
    #[serde(default)]
    curve: Option<serde_json::Value>,
    #[serde(default)]
    c2: Option<f32>,
    #[serde(default)]
    c3: Option<f32>,
    #[serde(default)]
    c4: Option<f32>,
}

impl SkeletonData {
    /// Deserializes a JSON skeleton document.
    pub fn from_json_str(text: &str) -> Result<SkeletonData, Error> {
        Self::from_json_str_with_scale(text, 1.0)
    }

    /// Deserializes a JSON skeleton document, multiplying every
    /// length-denominated field by `scale`.
    pub fn from_json_str_with_scale(text: &str, scale: f32) -> Result<SkeletonData, Error> {
        let scale = if scale.is_finite() { scale } else { 1.0 };
        let root: Root = serde_json::from_str(text).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })?;

        let header = root.skeleton.as_ref().ok_or(Error::JsonMissingHeader)?;
        let version = header.spine.clone().unwrap_or_default();
        let format = FormatVersion::lookup(&version)?;

        let mut data = SkeletonData {
            hash: header.hash.clone(),
            version: Some(version),
            x: header.x,
            y: header.y,
            width: header.width,
            height: header.height,
            reference_scale: header.reference_scale * scale,
            fps: header.fps,
            images_path: header.images.clone(),
            audio_path: header.audio.clone(),
            ..SkeletonData::default()
        };

        let bone_index = read_bones(&root, &mut data, scale)?;
        let slot_index = read_slots(&root, &mut data, &bone_index)?;

        match format {
            FormatVersion::V38 => v38::read_skeleton(root, data, scale, bone_index, slot_index),
            FormatVersion::V40 | FormatVersion::V42 => {
                v4x::read_skeleton(root, data, scale, format, bone_index, slot_index)
            }
        }
    }
}

fn read_bones(
    root: &Root,
    data: &mut SkeletonData,
    scale: f32,
) -> Result<HashMap<String, usize>, Error> {
    let mut bone_index = HashMap::new();
    for bone in &root.bones {
        let parent = match bone.parent.as_deref() {
            None => None,
            Some(parent_name) => Some(bone_index.get(parent_name).copied().ok_or_else(|| {
                Error::JsonUnknownBoneParent {
                    bone: bone.name.clone(),
                    parent: parent_name.to_string(),
                }
            })?),
        };
        let color = match bone.color.as_deref() {
            Some(value) => Some(parse_color_rgba(value, &bone.name)?),
            None => None,
        };
        bone_index.insert(bone.name.clone(), data.bones.len());
        data.bones.push(BoneData {
            name: bone.name.clone(),
            parent,
            length: bone.length * scale,
            x: bone.x * scale,
            y: bone.y * scale,
            rotation: bone.rotation,
            scale_x: bone.scale_x,
            scale_y: bone.scale_y,
            shear_x: bone.shear_x,
            shear_y: bone.shear_y,
            inherit: parse_inherit(bone.inherit.as_deref()),
            skin_required: bone.skin_required,
            color,
        });
    }
    Ok(bone_index)
}

fn read_slots(
    root: &Root,
    data: &mut SkeletonData,
    bone_index: &HashMap<String, usize>,
) -> Result<HashMap<String, usize>, Error> {
    let mut slot_index = HashMap::new();
    for slot in &root.slots {
        let bone = *bone_index
            .get(&slot.bone)
            .ok_or_else(|| Error::JsonUnknownSlotBone {
                slot: slot.name.clone(),
                bone: slot.bone.clone(),
            })?;
        let color = match slot.color.as_deref() {
            Some(value) => parse_color_rgba(value, &slot.name)?,
            None => [1.0; 4],
        };
        let dark_color = match slot.dark.as_deref() {
            Some(value) => Some(parse_color_rgb(value, &slot.name)?),
            None => None,
        };
        slot_index.insert(slot.name.clone(), data.slots.len());
        data.slots.push(SlotData {
            name: slot.name.clone(),
            bone,
            attachment: slot.attachment.clone(),
            color,
            dark_color,
            blend: parse_blend_mode(slot.blend.as_deref()),
        });
    }
    Ok(slot_index)
}

pub(crate) fn parse_inherit(raw: Option<&str>) -> Inherit {
    match raw.unwrap_or("normal") {
        "onlyTranslation" => Inherit::OnlyTranslation,
        "noRotationOrReflection" => Inherit::NoRotationOrReflection,
        "noScale" => Inherit::NoScale,
        "noScaleOrReflection" => Inherit::NoScaleOrReflection,
        _ => Inherit::Normal,
    }
}

pub(crate) fn parse_blend_mode(raw: Option<&str>) -> BlendMode {
    match raw.unwrap_or("normal") {
        "additive" => BlendMode::Additive,
        "multiply" => BlendMode::Multiply,
        "screen" => BlendMode::Screen,
        _ => BlendMode::Normal,
    }
}

pub(crate) fn parse_position_mode(raw: Option<&str>) -> PositionMode {
    match raw.unwrap_or("percent") {
        "fixed" => PositionMode::Fixed,
        _ => PositionMode::Percent,
    }
}

pub(crate) fn parse_spacing_mode(raw: Option<&str>) -> SpacingMode {
    match raw.unwrap_or("length") {
        "fixed" => SpacingMode::Fixed,
        "percent" => SpacingMode::Percent,
        "proportional" => SpacingMode::Proportional,
        _ => SpacingMode::Length,
    }
}

pub(crate) fn parse_rotate_mode(raw: Option<&str>) -> RotateMode {
    match raw.unwrap_or("tangent") {
        "chain" => RotateMode::Chain,
        "chainScale" => RotateMode::ChainScale,
        _ => RotateMode::Tangent,
    }
}

pub(crate) fn parse_sequence_mode(raw: Option<&str>) -> SequenceMode {
    match raw.unwrap_or("hold") {
        "once" => SequenceMode::Once,
        "loop" => SequenceMode::Loop,
        "pingpong" => SequenceMode::PingPong,
        "onceReverse" => SequenceMode::OnceReverse,
        "loopReverse" => SequenceMode::LoopReverse,
        "pingpongReverse" => SequenceMode::PingPongReverse,
        _ => SequenceMode::Hold,
    }
}

fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn hex_byte(pair: &[u8]) -> Option<f32> {
    let hi = hex_nibble(pair[0])?;
    let lo = hex_nibble(pair[1])?;
    Some((hi << 4 | lo) as f32 / 255.0)
}

pub(crate) fn parse_color_rgba(value: &str, context: &str) -> Result<[f32; 4], Error> {
    let bytes = value.as_bytes();
    if bytes.len() != 8 && bytes.len() != 6 {
        return Err(Error::JsonInvalidColor {
            context: context.to_string(),
            value: value.to_string(),
        });
    }
    let mut out = [1.0f32; 4];
    for (i, chunk) in bytes.chunks_exact(2).enumerate() {
        out[i] = hex_byte(chunk).ok_or_else(|| Error::JsonInvalidColor {
            context: context.to_string(),
            value: value.to_string(),
        })?;
    }
    Ok(out)
}

pub(crate) fn parse_color_rgb(value: &str, context: &str) -> Result<[f32; 3], Error> {
    let rgba = parse_color_rgba(value, context)?;
    Ok([rgba[0], rgba[1], rgba[2]])
}

/// Flat JSON vertex array: `2 * vertexCount` floats mean unweighted
/// positions; anything else is count-prefixed `(bone, x, y, weight)` groups.
pub(crate) fn parse_vertices(
    raw: &[f32],
    vertex_count: usize,
    bone_count: usize,
    scale: f32,
    context: impl Fn() -> (String, String, String),
) -> Result<Vertices, Error> {
    if raw.len() == vertex_count * 2 {
        let out = raw
            .chunks_exact(2)
            .map(|pair| [pair[0] * scale, pair[1] * scale])
            .collect();
        return Ok(Vertices::Unweighted(out));
    }

    let invalid = |message: &str| {
        let (skin, slot, attachment) = context();
        Error::JsonInvalidAttachmentData {
            skin,
            slot,
            attachment,
            message: message.to_string(),
        }
    };
    let expect_int = |value: f32| -> Result<usize, Error> {
        if !value.is_finite() || value < 0.0 || (value - value.round()).abs() > 1.0e-4 {
            return Err(invalid("non-integral count in weighted vertices"));
        }
        Ok(value.round() as usize)
    };

    let mut cursor = 0usize;
    let mut out = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let &influences = raw
            .get(cursor)
            .ok_or_else(|| invalid("unexpected end of weighted vertices"))?;
        cursor += 1;
        let influences = expect_int(influences)?;
        let mut weights = Vec::with_capacity(influences);
        for _ in 0..influences {
            let group = raw
                .get(cursor..cursor + 4)
                .ok_or_else(|| invalid("unexpected end of weighted vertices"))?;
            cursor += 4;
            let bone = expect_int(group[0])?;
            if bone >= bone_count {
                return Err(invalid("bone index out of range in weighted vertices"));
            }
            weights.push(VertexWeight {
                bone,
                x: group[1] * scale,
                y: group[2] * scale,
                weight: group[3],
            });
        }
        out.push(weights);
    }
    if cursor != raw.len() {
        return Err(invalid("unexpected extra data in weighted vertices"));
    }
    Ok(Vertices::Weighted(out))
}

pub(crate) struct LinkedMeshRef {
    pub skin: String,
    pub slot_index: usize,
    pub attachment_key: String,
    pub parent_skin: Option<String>,
    pub parent_key: String,
    pub inherit_timeline: bool,
}

/// Builds every skin and queues linked meshes for the post pass.
#[allow(clippy::too_many_arguments)]
pub(crate) fn read_skins(
    root: &Root,
    data: &mut SkeletonData,
    scale: f32,
    sequences: bool,
    physics: bool,
    bone_index: &HashMap<String, usize>,
    slot_index: &HashMap<String, usize>,
    pending: &mut Vec<LinkedMeshRef>,
) -> Result<(), Error> {
    let Some(skins) = &root.skins else {
        return Ok(());
    };

    match skins {
        SkinsDef::Array(defs) => {
            for def in defs {
                let mut skin = SkinData::new(def.name.clone(), data.slots.len());
                for bone in &def.bones {
                    skin.bones.push(*bone_index.get(bone).ok_or_else(|| {
                        Error::JsonUnknownSkinBone {
                            skin: def.name.clone(),
                            bone: bone.clone(),
                        }
                    })?);
                }
                for name in &def.ik {
                    skin.ik_constraints.push(
                        data.ik_constraints
                            .iter()
                            .position(|c| &c.name == name)
                            .ok_or_else(|| Error::JsonUnknownSkinConstraint {
                                skin: def.name.clone(),
                                kind: "ik".to_string(),
                                constraint: name.clone(),
                            })?,
                    );
                }
                for name in &def.transform {
                    skin.transform_constraints.push(
                        data.transform_constraints
                            .iter()
                            .position(|c| &c.name == name)
                            .ok_or_else(|| Error::JsonUnknownSkinConstraint {
                                skin: def.name.clone(),
                                kind: "transform".to_string(),
                                constraint: name.clone(),
                            })?,
                    );
                }
                for name in &def.path {
                    skin.path_constraints.push(
                        data.path_constraints
                            .iter()
                            .position(|c| &c.name == name)
                            .ok_or_else(|| Error::JsonUnknownSkinConstraint {
                                skin: def.name.clone(),
                                kind: "path".to_string(),
                                constraint: name.clone(),
                            })?,
                    );
                }
                if physics {
                    for name in &def.physics {
                        skin.physics_constraints.push(
                            data.physics_constraints
                                .iter()
                                .position(|c| &c.name == name)
                                .ok_or_else(|| Error::JsonUnknownSkinConstraint {
                                    skin: def.name.clone(),
                                    kind: "physics".to_string(),
                                    constraint: name.clone(),
                                })?,
                        );
                    }
                }
                read_skin_attachments(
                    &def.attachments,
                    &mut skin,
                    data,
                    scale,
                    sequences,
                    slot_index,
                    pending,
                )?;
                if skin.name == "default" {
                    data.default_skin = Some(data.skins.len());
                }
                data.skins.push(skin);
            }
        }
        SkinsDef::Map(map) => {
            for (name, attachments) in &map.0 {
                let mut skin = SkinData::new(name.clone(), data.slots.len());
                read_skin_attachments(
                    attachments,
                    &mut skin,
                    data,
                    scale,
                    sequences,
                    slot_index,
                    pending,
                )?;
                if skin.name == "default" {
                    data.default_skin = Some(data.skins.len());
                }
                data.skins.push(skin);
            }
        }
    }
    Ok(())
}

fn read_skin_attachments(
    attachments: &HashMap<String, HashMap<String, AttachmentDef>>,
    skin: &mut SkinData,
    data: &SkeletonData,
    scale: f32,
    sequences: bool,
    slot_index: &HashMap<String, usize>,
    pending: &mut Vec<LinkedMeshRef>,
) -> Result<(), Error> {
    for (slot_name, slot_attachments) in attachments {
        let slot = *slot_index
            .get(slot_name)
            .ok_or_else(|| Error::JsonUnknownSkinSlot {
                skin: skin.name.clone(),
                slot: slot_name.clone(),
            })?;
        for (key, def) in slot_attachments {
            let attachment = read_attachment(
                def,
                data,
                scale,
                sequences,
                &skin.name,
                slot_name,
                slot,
                key,
                slot_index,
                pending,
            )?;
            skin.attachments[slot].insert(key.clone(), attachment);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn read_attachment(
    def: &AttachmentDef,
    data: &SkeletonData,
    scale: f32,
    sequences: bool,
    skin_name: &str,
    slot_name: &str,
    slot: usize,
    key: &str,
    slot_index: &HashMap<String, usize>,
    pending: &mut Vec<LinkedMeshRef>,
) -> Result<AttachmentData, Error> {
    let name = def.name.clone().unwrap_or_else(|| key.to_string());
    let color_context = || format!("attachment '{name}'");
    let sequence = if sequences {
        def.sequence.as_ref().map(|s| SequenceDef {
            count: s.count,
            start: s.start,
            digits: s.digits,
            setup_index: s.setup_index,
        })
    } else {
        None
    };
    let vertices_context = || {
        (
            skin_name.to_string(),
            slot_name.to_string(),
            name.clone(),
        )
    };

    match def.attachment_type.as_deref().unwrap_or("region") {
        "region" => {
            let color = match def.color.as_deref() {
                Some(value) => parse_color_rgba(value, &color_context())?,
                None => [1.0; 4],
            };
            Ok(AttachmentData::Region(RegionAttachmentData {
                path: def.path.clone().unwrap_or_else(|| name.clone()),
                name,
                x: def.x * scale,
                y: def.y * scale,
                rotation: def.rotation,
                scale_x: def.scale_x,
                scale_y: def.scale_y,
                width: def.width * scale,
                height: def.height * scale,
                color,
                sequence,
            }))
        }
        "boundingbox" => {
            let vertices = parse_vertices(
                &def.vertices,
                def.vertex_count,
                data.bones.len(),
                scale,
                vertices_context,
            )?;
            let color = match def.color.as_deref() {
                Some(value) => Some(parse_color_rgba(value, &color_context())?),
                None => None,
            };
            Ok(AttachmentData::BoundingBox(BoundingBoxAttachmentData {
                name,
                vertices,
                color,
            }))
        }
        "mesh" => {
            let color = match def.color.as_deref() {
                Some(value) => parse_color_rgba(value, &color_context())?,
                None => [1.0; 4],
            };
            let vertex_count = def.uvs.len() / 2;
            let vertices = parse_vertices(
                &def.vertices,
                vertex_count,
                data.bones.len(),
                scale,
                vertices_context,
            )?;
            Ok(AttachmentData::Mesh(MeshAttachmentData {
                path: def.path.clone().unwrap_or_else(|| name.clone()),
                name,
                color,
                vertices,
                uvs: def.uvs.clone(),
                triangles: def.triangles.clone(),
                hull_length: def.hull << 1,
                edges: def.edges.clone(),
                width: def.width * scale,
                height: def.height * scale,
                sequence,
                parent: None,
                timeline_skin: skin_name.to_string(),
                timeline_attachment: key.to_string(),
            }))
        }
        "linkedmesh" => {
            let color = match def.color.as_deref() {
                Some(value) => parse_color_rgba(value, &color_context())?,
                None => [1.0; 4],
            };
            let parent_key = def.parent.clone().ok_or_else(|| {
                Error::JsonInvalidAttachmentData {
                    skin: skin_name.to_string(),
                    slot: slot_name.to_string(),
                    attachment: name.clone(),
                    message: "linked mesh missing parent".to_string(),
                }
            })?;
            pending.push(LinkedMeshRef {
                skin: skin_name.to_string(),
                slot_index: slot,
                attachment_key: key.to_string(),
                parent_skin: def.skin.clone(),
                parent_key,
                inherit_timeline: def.timelines.unwrap_or(true),
            });
            Ok(AttachmentData::Mesh(MeshAttachmentData {
                path: def.path.clone().unwrap_or_else(|| name.clone()),
                name,
                color,
                vertices: Vertices::Unweighted(Vec::new()),
                uvs: Vec::new(),
                triangles: Vec::new(),
                hull_length: 0,
                edges: Vec::new(),
                width: def.width * scale,
                height: def.height * scale,
                sequence,
                parent: None,
                timeline_skin: skin_name.to_string(),
                timeline_attachment: key.to_string(),
            }))
        }
        "path" => {
            let vertices = parse_vertices(
                &def.vertices,
                def.vertex_count,
                data.bones.len(),
                scale,
                vertices_context,
            )?;
            let color = match def.color.as_deref() {
                Some(value) => Some(parse_color_rgba(value, &color_context())?),
                None => None,
            };
            Ok(AttachmentData::Path(PathAttachmentData {
                name,
                closed: def.closed,
                constant_speed: def.constant_speed,
                vertices,
                lengths: def.lengths.iter().map(|&l| l * scale).collect(),
                color,
            }))
        }
        "point" => {
            let color = match def.color.as_deref() {
                Some(value) => Some(parse_color_rgba(value, &color_context())?),
                None => None,
            };
            Ok(AttachmentData::Point(PointAttachmentData {
                name,
                x: def.x * scale,
                y: def.y * scale,
                rotation: def.rotation,
                color,
            }))
        }
        "clipping" => {
            let end_name = def.end.as_deref().ok_or_else(|| {
                Error::JsonInvalidAttachmentData {
                    skin: skin_name.to_string(),
                    slot: slot_name.to_string(),
                    attachment: name.clone(),
                    message: "clipping attachment missing end slot".to_string(),
                }
            })?;
            let end_slot =
                *slot_index
                    .get(end_name)
                    .ok_or_else(|| Error::JsonInvalidAttachmentData {
                        skin: skin_name.to_string(),
                        slot: slot_name.to_string(),
                        attachment: name.clone(),
                        message: format!("unknown clipping end slot '{end_name}'"),
                    })?;
            let vertices = parse_vertices(
                &def.vertices,
                def.vertex_count,
                data.bones.len(),
                scale,
                vertices_context,
            )?;
            let color = match def.color.as_deref() {
                Some(value) => Some(parse_color_rgba(value, &color_context())?),
                None => None,
            };
            Ok(AttachmentData::Clipping(ClippingAttachmentData {
                name,
                end_slot,
                vertices,
                color,
            }))
        }
        other => Err(Error::JsonUnsupportedAttachmentType {
            skin: skin_name.to_string(),
            slot: slot_name.to_string(),
            attachment: name,
            attachment_type: other.to_string(),
        }),
    }
}

/// Resolves queued linked meshes once every skin is built; mirrors the
/// binary post pass.
pub(crate) fn resolve_linked_meshes(
    data: &mut SkeletonData,
    pending: Vec<LinkedMeshRef>,
) -> Result<(), Error> {
    let mut remaining = pending;
    while !remaining.is_empty() {
        let mut deferred = Vec::new();
        let mut resolved_any = false;

        for p in remaining {
            let parent_skin_index = match p.parent_skin.as_deref() {
                None | Some("") => data.default_skin.ok_or_else(|| Error::SkinNotFound {
                    name: "default".to_string(),
                })?,
                Some(name) => {
                    data.find_skin_index(name)
                        .ok_or_else(|| Error::SkinNotFound {
                            name: name.to_string(),
                        })?
                }
            };
            let parent_skin_name = data.skins[parent_skin_index].name.clone();
            let parent = data.skins[parent_skin_index]
                .attachment(p.slot_index, &p.parent_key)
                .ok_or_else(|| Error::ParentMeshNotFound {
                    name: p.parent_key.clone(),
                })?;
            let AttachmentData::Mesh(parent_mesh) = parent else {
                return Err(Error::ParentMeshNotFound {
                    name: p.parent_key.clone(),
                });
            };
            if parent_mesh.parent.is_none() && parent_mesh.uvs.is_empty() {
                deferred.push(p);
                continue;
            }

            let vertices = parent_mesh.vertices.clone();
            let uvs = parent_mesh.uvs.clone();
            let triangles = parent_mesh.triangles.clone();
            let hull_length = parent_mesh.hull_length;

            let skin_index = data
                .find_skin_index(&p.skin)
                .ok_or_else(|| Error::SkinNotFound {
                    name: p.skin.clone(),
                })?;
            let Some(AttachmentData::Mesh(mesh)) = data.skins[skin_index]
                .attachments
                .get_mut(p.slot_index)
                .and_then(|m| m.get_mut(&p.attachment_key))
            else {
                return Err(Error::ParentMeshNotFound {
                    name: p.attachment_key.clone(),
                });
            };
            mesh.vertices = vertices;
            mesh.uvs = uvs;
            mesh.triangles = triangles;
            mesh.hull_length = hull_length;
            mesh.parent = Some((parent_skin_name.clone(), p.parent_key.clone()));
            if p.inherit_timeline {
                mesh.timeline_skin = parent_skin_name;
                mesh.timeline_attachment = p.parent_key;
            }
            resolved_any = true;
        }

        if !resolved_any && !deferred.is_empty() {
            let p = &deferred[0];
            return Err(Error::ParentMeshNotFound {
                name: p.parent_key.clone(),
            });
        }
        remaining = deferred;
    }
    Ok(())
}

pub(crate) fn read_events(root: &Root, data: &mut SkeletonData) {
    for (name, def) in &root.events.0 {
        data.events.push(EventData {
            name: name.clone(),
            int_value: def.int_value,
            float_value: def.float_value,
            string_value: def.string_value.clone(),
            audio_path: def.audio_path.clone(),
            volume: def.volume,
            balance: def.balance,
        });
    }
}

/// Rebuilds a draw-order frame permutation from named offsets.
pub(crate) fn build_draw_order(
    offsets: &[DrawOrderOffset],
    slot_index: &HashMap<String, usize>,
    slot_count: usize,
    animation: &str,
) -> Result<Vec<usize>, Error> {
    let mut draw_order = vec![usize::MAX; slot_count];
    let mut unchanged = Vec::with_capacity(slot_count.saturating_sub(offsets.len()));
    let mut original_index = 0usize;

    for offset in offsets {
        let slot =
            *slot_index
                .get(&offset.slot)
                .ok_or_else(|| Error::JsonInvalidDrawOrder {
                    animation: animation.to_string(),
                    message: format!("unknown slot '{}' in drawOrder offsets", offset.slot),
                })?;
        while original_index != slot {
            if original_index >= slot_count {
                return Err(Error::JsonInvalidDrawOrder {
                    animation: animation.to_string(),
                    message: "offsets out of slot order".to_string(),
                });
            }
            unchanged.push(original_index);
            original_index += 1;
        }
        let target = original_index as i64 + offset.offset as i64;
        if target < 0 || target >= slot_count as i64 {
            return Err(Error::JsonInvalidDrawOrder {
                animation: animation.to_string(),
                message: format!(
                    "offset {} out of range for slot '{}'",
                    offset.offset, offset.slot
                ),
            });
        }
        if draw_order[target as usize] != usize::MAX {
            return Err(Error::JsonInvalidDrawOrder {
                animation: animation.to_string(),
                message: format!("duplicate target position for slot '{}'", offset.slot),
            });
        }
        draw_order[target as usize] = original_index;
        original_index += 1;
    }
    while original_index < slot_count {
        unchanged.push(original_index);
        original_index += 1;
    }
    let mut unchanged_index = unchanged.len();
    for slot in draw_order.iter_mut().rev() {
        if *slot == usize::MAX {
            unchanged_index -= 1;
            *slot = unchanged[unchanged_index];
        }
    }
    Ok(draw_order)
}

/// Builds one deform frame's flat values from a key: missing vertices key
/// the identity deformation; otherwise the `offset`-based slice is scaled
/// and, for unweighted attachments, the setup values are added throughout.
pub(crate) fn deform_frame_values(
    key: &DeformKey,
    deform_length: usize,
    setup: Option<&[f32]>,
    scale: f32,
    invalid: impl Fn(String) -> Error,
) -> Result<Vec<f32>, Error> {
    if key.vertices.is_empty() {
        return Ok(match setup {
            Some(setup) => setup.to_vec(),
            None => vec![0.0; deform_length],
        });
    }
    let start = key.offset;
    let stop = start + key.vertices.len();
    if stop > deform_length {
        return Err(invalid(format!(
            "deform slice {start}..{stop} out of range (len {deform_length})"
        )));
    }
    let mut values = vec![0.0f32; deform_length];
    for (out, &v) in values[start..stop].iter_mut().zip(&key.vertices) {
        *out = v * scale;
    }
    if let Some(setup) = setup {
        for (out, &s) in values.iter_mut().zip(setup) {
            *out += s;
        }
    }
    Ok(values)
}

/// Finds the deform target attachment of an attachment timeline.
pub(crate) fn deform_target<'a>(
    data: &'a SkeletonData,
    animation: &str,
    skin_name: &str,
    slot_index: usize,
    attachment_name: &str,
) -> Result<&'a Vertices, Error> {
    let skin = data
        .skin(skin_name)
        .ok_or_else(|| Error::JsonUnknownTimelineSkin {
            animation: animation.to_string(),
            skin: skin_name.to_string(),
        })?;
    let attachment =
        skin.attachment(slot_index, attachment_name)
            .ok_or_else(|| Error::AttachmentNotFound {
                name: attachment_name.to_string(),
            })?;
    match attachment {
        AttachmentData::Mesh(a) => Ok(&a.vertices),
        AttachmentData::BoundingBox(a) => Ok(&a.vertices),
        AttachmentData::Path(a) => Ok(&a.vertices),
        AttachmentData::Clipping(a) => Ok(&a.vertices),
        _ => Err(Error::JsonInvalidAttachmentData {
            skin: skin_name.to_string(),
            slot: slot_index.to_string(),
            attachment: attachment_name.to_string(),
            message: "attachment cannot be deformed".to_string(),
        }),
    }
}

/// 3.8 curve shape: `"stepped"`, a four-float array, or a bare `cx1` with
/// sibling `c2`..`c4` values.
pub(crate) fn parse_curve_38(key: &CurveKey, context: &str) -> Result<Curve, Error> {
    let Some(value) = &key.curve else {
        return Ok(Curve::Linear);
    };
    if let Some(s) = value.as_str() {
        return Ok(if s == "stepped" {
            Curve::Stepped
        } else {
            Curve::Linear
        });
    }
    if let Some(cx1) = value.as_f64() {
        return Ok(Curve::Bezier {
            cx1: cx1 as f32,
            cy1: key.c2.unwrap_or(0.0),
            cx2: key.c3.unwrap_or(1.0),
            cy2: key.c4.unwrap_or(1.0),
        });
    }
    let Some(arr) = value.as_array() else {
        return Ok(Curve::Linear);
    };
    if arr.len() != 4 {
        return Err(Error::JsonInvalidCurve {
            context: context.to_string(),
            message: format!("expected 4 numbers, got {}", arr.len()),
        });
    }
    let mut floats = [0.0f32; 4];
    for (out, value) in floats.iter_mut().zip(arr) {
        *out = value.as_f64().ok_or_else(|| Error::JsonInvalidCurve {
            context: context.to_string(),
            message: "curve entries must be numbers".to_string(),
        })? as f32;
    }
    Ok(Curve::Bezier {
        cx1: floats[0],
        cy1: floats[1],
        cx2: floats[2],
        cy2: floats[3],
    })
}

/// 4.x curve shape: `"stepped"` or a flat array of four floats per value
/// channel. `cy` components scale with the channel's value scale.
pub(crate) fn parse_curve_4x<const N: usize>(
    key: &CurveKey,
    scales: [f32; N],
    context: &str,
) -> Result<[Curve; N], Error> {
    let Some(value) = &key.curve else {
        return Ok([Curve::Linear; N]);
    };
    if let Some(s) = value.as_str() {
        return Ok(if s == "stepped" {
            [Curve::Stepped; N]
        } else {
            [Curve::Linear; N]
        });
    }
    let Some(arr) = value.as_array() else {
        return Ok([Curve::Linear; N]);
    };
    let expected = 4 * N;
    if arr.len() != expected {
        return Err(Error::JsonInvalidCurve {
            context: context.to_string(),
            message: format!("expected {expected} numbers, got {}", arr.len()),
        });
    }
    let number = |index: usize| -> Result<f32, Error> {
        arr[index]
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| Error::JsonInvalidCurve {
                context: context.to_string(),
                message: format!("curve[{index}] must be a number"),
            })
    };
    let mut out = [Curve::Linear; N];
    for (channel, curve) in out.iter_mut().enumerate() {
        let base = channel * 4;
        *curve = Curve::Bezier {
            cx1: number(base)?,
            cy1: number(base + 1)? * scales[channel],
            cx2: number(base + 2)?,
            cy2: number(base + 3)? * scales[channel],
        };
    }
    Ok(out)
}

pub(crate) fn parse_curve_4x_1(key: &CurveKey, scale: f32, context: &str) -> Result<Curve, Error> {
    Ok(parse_curve_4x(key, [scale], context)?[0])
}
