//! Binary reader for 4.2 exports (4.1 documents decode here as well).
//!
//! The layout extends 4.0 with a reference-scale header float, physics
//! constraints, image sequences, bone inherit timelines and per-kind
//! attachment timelines.

use super::timelines::{
    read_alpha_timeline, read_deform_timeline, read_ik_timeline_frames,
    read_path_mix_timeline_frames, read_rgb2_timeline, read_rgb_timeline, read_rgba2_timeline,
    read_rgba_timeline, read_rotate_timeline, read_timeline1, read_timeline2,
    read_transform_timeline_frames,
};
use super::{BinaryInput, PendingLinkedMesh};
use crate::{
    Animation, AttachmentData, AttachmentFrame, AttachmentTimeline, BoneData, BoneTimeline,
    BoundingBoxAttachmentData, ClippingAttachmentData, Error, IkConstraintTimeline, InheritFrame,
    InheritTimeline, MeshAttachmentData, PathAttachmentData, PathConstraintMixTimeline,
    PathConstraintPositionTimeline, PathConstraintSpacingTimeline, PathConstraintTimeline,
    PhysicsConstraintData, PhysicsConstraintFloatTimeline, PhysicsConstraintResetTimeline,
    PhysicsConstraintTimeline, PointAttachmentData, PositionMode, RegionAttachmentData,
    RotateTimeline, ScaleTimeline, ScaleXTimeline, ScaleYTimeline, SequenceDef, SequenceFrame,
    SequenceTimeline, ShearTimeline, ShearXTimeline, ShearYTimeline, SkeletonData, SkinData,
    SlotData, SlotTimeline, SpacingMode, TransformConstraintTimeline, TranslateTimeline,
    TranslateXTimeline, TranslateYTimeline, Vertices,
};

const SLOT_ATTACHMENT: u8 = 0;
const SLOT_RGBA: u8 = 1;
const SLOT_RGB: u8 = 2;
const SLOT_RGBA2: u8 = 3;
const SLOT_RGB2: u8 = 4;
const SLOT_ALPHA: u8 = 5;

const BONE_ROTATE: u8 = 0;
const BONE_TRANSLATE: u8 = 1;
const BONE_TRANSLATEX: u8 = 2;
const BONE_TRANSLATEY: u8 = 3;
const BONE_SCALE: u8 = 4;
const BONE_SCALEX: u8 = 5;
const BONE_SCALEY: u8 = 6;
const BONE_SHEAR: u8 = 7;
const BONE_SHEARX: u8 = 8;
const BONE_SHEARY: u8 = 9;
const BONE_INHERIT: u8 = 10;

const ATTACHMENT_DEFORM: u8 = 0;
const ATTACHMENT_SEQUENCE: u8 = 1;

const PATH_POSITION: i8 = 0;
const PATH_SPACING: i8 = 1;
const PATH_MIX: i8 = 2;

const PHYSICS_INERTIA: i8 = 0;
const PHYSICS_STRENGTH: i8 = 1;
const PHYSICS_DAMPING: i8 = 2;
const PHYSICS_MASS: i8 = 4;
const PHYSICS_WIND: i8 = 5;
const PHYSICS_GRAVITY: i8 = 6;
const PHYSICS_MIX: i8 = 7;
const PHYSICS_RESET: i8 = 8;

pub(super) fn read_skeleton(
    input: &mut BinaryInput<'_>,
    mut data: SkeletonData,
    scale: f32,
) -> Result<SkeletonData, Error> {
    data.x = input.read_f32_be()?;
    data.y = input.read_f32_be()?;
    data.width = input.read_f32_be()?;
    data.height = input.read_f32_be()?;
    data.reference_scale = input.read_f32_be()? * scale;

    let nonessential = input.read_bool()?;
    if nonessential {
        data.fps = input.read_f32_be()?;
        data.images_path = input.read_string()?;
        data.audio_path = input.read_string()?;
    }

    let strings_count = input.read_count("string")?;
    let mut strings = Vec::with_capacity(strings_count);
    for _ in 0..strings_count {
        strings.push(input.read_string()?.unwrap_or_default());
    }

    // Bones.
    let bones_count = input.read_count("bone")?;
    for i in 0..bones_count {
        let name = input.read_string()?.unwrap_or_default();
        let parent = if i == 0 {
            None
        } else {
            Some(input.read_index(data.bones.len(), "bone parent")?)
        };
        let rotation = input.read_f32_be()?;
        let x = input.read_f32_be()? * scale;
        let y = input.read_f32_be()? * scale;
        let scale_x = input.read_f32_be()?;
        let scale_y = input.read_f32_be()?;
        let shear_x = input.read_f32_be()?;
        let shear_y = input.read_f32_be()?;
        let length = input.read_f32_be()? * scale;
        let inherit = super::map_inherit(input.read_varint(true)?);
        let skin_required = input.read_bool()?;
        let color = if nonessential {
            let color = input.read_color_rgba()?;
            let _icon = input.read_string()?;
            let _visible = input.read_bool()?;
            Some(color)
        } else {
            None
        };
        data.bones.push(BoneData {
            name,
            parent,
            length,
            x,
            y,
            rotation,
            scale_x,
            scale_y,
            shear_x,
            shear_y,
            inherit,
            skin_required,
            color,
        });
    }

    // Slots.
    let slots_count = input.read_count("slot")?;
    for _ in 0..slots_count {
        let name = input.read_string()?.unwrap_or_default();
        let bone = input.read_index(data.bones.len(), "slot bone")?;
        let color = input.read_color_rgba()?;

        let a = input.read_u8()?;
        let r = input.read_u8()?;
        let g = input.read_u8()?;
        let b = input.read_u8()?;
        let dark_color = if r == 0xff && g == 0xff && b == 0xff && a == 0xff {
            None
        } else {
            Some([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
        };

        let attachment = input.read_string_ref(&strings)?;
        let blend = super::map_blend(input.read_varint(true)?);
        if nonessential {
            let _visible = input.read_bool()?;
        }
        data.slots.push(SlotData {
            name,
            bone,
            attachment,
            color,
            dark_color,
            blend,
        });
    }

    super::v40::read_ik_constraints(input, &mut data, scale)?;
    super::v40::read_transform_constraints(input, &mut data, scale)?;
    super::v40::read_path_constraints(input, &mut data, scale)?;
    read_physics_constraints(input, &mut data, scale)?;

    // Skins.
    let mut pending = Vec::<PendingLinkedMesh>::new();
    if let Some(skin) = read_skin(input, true, &data, &strings, nonessential, scale, &mut pending)?
    {
        data.skins.push(skin);
        data.default_skin = Some(0);
    }
    let skins_count = input.read_count("skin")?;
    for _ in 0..skins_count {
        let skin = read_skin(input, false, &data, &strings, nonessential, scale, &mut pending)?
            .ok_or_else(|| Error::BinaryParse {
                message: "missing skin name".to_string(),
            })?;
        data.skins.push(skin);
    }

    super::resolve_linked_meshes(&mut data, pending)?;

    data.events = super::read_event_data(input, &strings, false)?;

    let animations_count = input.read_count("animation")?;
    for _ in 0..animations_count {
        let name = input.read_string()?.unwrap_or_default();
        let animation = read_animation(input, name, &data, &strings, scale)?;
        data.animations.push(animation);
    }

    Ok(data)
}

fn read_physics_constraints(
    input: &mut BinaryInput<'_>,
    data: &mut SkeletonData,
    scale: f32,
) -> Result<(), Error> {
    let count = input.read_count("physics constraint")?;
    for _ in 0..count {
        let name = input.read_string()?.unwrap_or_default();
        let order = input.read_varint(true)?;
        let bone = input.read_index(data.bones.len(), "physics constraint bone")?;

        let flags = input.read_u8()?;
        let skin_required = (flags & 1) != 0;
        let x = if (flags & 2) != 0 {
            input.read_f32_be()?
        } else {
            0.0
        };
        let y = if (flags & 4) != 0 {
            input.read_f32_be()?
        } else {
            0.0
        };
        let rotate = if (flags & 8) != 0 {
            input.read_f32_be()?
        } else {
            0.0
        };
        let scale_x = if (flags & 16) != 0 {
            input.read_f32_be()?
        } else {
            0.0
        };
        let shear_x = if (flags & 32) != 0 {
            input.read_f32_be()?
        } else {
            0.0
        };
        let limit = if (flags & 64) != 0 {
            input.read_f32_be()? * scale
        } else {
            5000.0 * scale
        };
        let step_div = input.read_u8()? as f32;
        let step = if step_div > 0.0 { 1.0 / step_div } else { 1.0 };
        let inertia = input.read_f32_be()?;
        let strength = input.read_f32_be()?;
        let damping = input.read_f32_be()?;
        let mass_inverse = if (flags & 128) != 0 {
            input.read_f32_be()?
        } else {
            1.0
        };
        let wind = input.read_f32_be()?;
        let gravity = input.read_f32_be()?;

        let flags = input.read_u8()?;
        let inertia_global = (flags & 1) != 0;
        let strength_global = (flags & 2) != 0;
        let damping_global = (flags & 4) != 0;
        let mass_global = (flags & 8) != 0;
        let wind_global = (flags & 16) != 0;
        let gravity_global = (flags & 32) != 0;
        let mix_global = (flags & 64) != 0;
        let mix = if (flags & 128) != 0 {
            input.read_f32_be()?
        } else {
            1.0
        };

        data.physics_constraints.push(PhysicsConstraintData {
            name,
            order,
            skin_required,
            bone,
            x,
            y,
            rotate,
            scale_x,
            shear_x,
            limit,
            step,
            inertia,
            strength,
            damping,
            mass_inverse,
            wind,
            gravity,
            mix,
            inertia_global,
            strength_global,
            damping_global,
            mass_global,
            wind_global,
            gravity_global,
            mix_global,
        });
    }
    Ok(())
}

fn read_sequence(input: &mut BinaryInput<'_>) -> Result<Option<SequenceDef>, Error> {
    if !input.read_bool()? {
        return Ok(None);
    }
    Ok(Some(SequenceDef {
        count: input.read_count("sequence frame")?,
        start: input.read_varint(true)?,
        digits: input.read_count("sequence digit")?,
        setup_index: input.read_varint(true)?,
    }))
}

#[allow(clippy::too_many_arguments)]
fn read_skin(
    input: &mut BinaryInput<'_>,
    default_skin: bool,
    data: &SkeletonData,
    strings: &[String],
    nonessential: bool,
    scale: f32,
    pending: &mut Vec<PendingLinkedMesh>,
) -> Result<Option<SkinData>, Error> {
    let mut skin;
    let slot_count;
    if default_skin {
        slot_count = input.read_count("skin slot")?;
        if slot_count == 0 {
            return Ok(None);
        }
        skin = SkinData::new("default".to_string(), data.slots.len());
    } else {
        let name = input
            .read_string_ref(strings)?
            .ok_or_else(|| Error::BinaryParse {
                message: "missing skin name".to_string(),
            })?;
        skin = SkinData::new(name, data.slots.len());
        if nonessential {
            let _color = input.read_color_rgba()?;
        }
        for _ in 0..input.read_count("skin bone")? {
            skin.bones
                .push(input.read_index(data.bones.len(), "skin bone")?);
        }
        for _ in 0..input.read_count("skin ik constraint")? {
            skin.ik_constraints
                .push(input.read_index(data.ik_constraints.len(), "skin ik constraint")?);
        }
        for _ in 0..input.read_count("skin transform constraint")? {
            skin.transform_constraints.push(input.read_index(
                data.transform_constraints.len(),
                "skin transform constraint",
            )?);
        }
        for _ in 0..input.read_count("skin path constraint")? {
            skin.path_constraints
                .push(input.read_index(data.path_constraints.len(), "skin path constraint")?);
        }
        for _ in 0..input.read_count("skin physics constraint")? {
            skin.physics_constraints.push(
                input.read_index(data.physics_constraints.len(), "skin physics constraint")?,
            );
        }
        slot_count = input.read_count("skin slot")?;
    }

    let skin_index = data.skins.len();
    for _ in 0..slot_count {
        let slot_index = input.read_index(data.slots.len(), "skin slot")?;
        let attachment_count = input.read_count("attachment")?;
        for _ in 0..attachment_count {
            let key = input.read_string_ref(strings)?.unwrap_or_default();
            let attachment = read_attachment(
                input,
                data,
                strings,
                skin_index,
                slot_index,
                &skin.name,
                &key,
                nonessential,
                scale,
                pending,
            )
            .map_err(|e| Error::BinaryParse {
                message: format!(
                    "failed to read attachment (skin {:?}, slot {slot_index}, key {key:?}): {e}",
                    skin.name
                ),
            })?;
            skin.attachments[slot_index].insert(key, attachment);
        }
    }
    Ok(Some(skin))
}

#[allow(clippy::too_many_arguments)]
fn read_attachment(
    input: &mut BinaryInput<'_>,
    data: &SkeletonData,
    strings: &[String],
    skin_index: usize,
    slot_index: usize,
    skin_name: &str,
    attachment_key: &str,
    nonessential: bool,
    scale: f32,
    pending: &mut Vec<PendingLinkedMesh>,
) -> Result<AttachmentData, Error> {
    let name = input
        .read_string_ref(strings)?
        .unwrap_or_else(|| attachment_key.to_string());

    match input.read_u8()? {
        0 => {
            // Region.
            let path = input
                .read_string_ref(strings)?
                .unwrap_or_else(|| name.clone());
            let rotation = input.read_f32_be()?;
            let x = input.read_f32_be()? * scale;
            let y = input.read_f32_be()? * scale;
            let scale_x = input.read_f32_be()?;
            let scale_y = input.read_f32_be()?;
            let width = input.read_f32_be()? * scale;
            let height = input.read_f32_be()? * scale;
            let color = input.read_color_rgba()?;
            let sequence = read_sequence(input)?;
            Ok(AttachmentData::Region(RegionAttachmentData {
                name,
                path,
                x,
                y,
                rotation,
                scale_x,
                scale_y,
                width,
                height,
                color,
                sequence,
            }))
        }
        1 => {
            // Bounding box.
            let vertex_count = input.read_count("vertex")?;
            let vertices = super::read_vertices(input, vertex_count, data.bones.len(), scale)?;
            let color = if nonessential {
                Some(input.read_color_rgba()?)
            } else {
                None
            };
            Ok(AttachmentData::BoundingBox(BoundingBoxAttachmentData {
                name,
                vertices,
                color,
            }))
        }
        2 => {
            // Mesh.
            let path = input
                .read_string_ref(strings)?
                .unwrap_or_else(|| name.clone());
            let color = input.read_color_rgba()?;
            let vertex_count = input.read_count("vertex")?;
            let uvs = input.read_float_array(vertex_count << 1, 1.0)?;
            let triangles = input.read_short_array()?;
            let vertices = super::read_vertices(input, vertex_count, data.bones.len(), scale)?;
            let hull_length = input.read_count("hull")? << 1;
            let (edges, width, height) = if nonessential {
                let edges = input.read_short_array()?;
                let width = input.read_f32_be()? * scale;
                let height = input.read_f32_be()? * scale;
                (edges, width, height)
            } else {
                (Vec::new(), 0.0, 0.0)
            };
            let sequence = read_sequence(input)?;
            Ok(AttachmentData::Mesh(MeshAttachmentData {
                name,
                path,
                color,
                vertices,
                uvs,
                triangles,
                hull_length,
                edges,
                width,
                height,
                sequence,
                parent: None,
                timeline_skin: skin_name.to_string(),
                timeline_attachment: attachment_key.to_string(),
            }))
        }
        3 => {
            // Linked mesh.
            let path = input
                .read_string_ref(strings)?
                .unwrap_or_else(|| name.clone());
            let color = input.read_color_rgba()?;
            let parent_skin = input.read_string_ref(strings)?;
            let parent_key = input
                .read_string_ref(strings)?
                .ok_or_else(|| Error::BinaryParse {
                    message: "linked mesh missing parent name".to_string(),
                })?;
            let inherit_timeline = input.read_bool()?;
            let (width, height) = if nonessential {
                (input.read_f32_be()? * scale, input.read_f32_be()? * scale)
            } else {
                (0.0, 0.0)
            };
            let sequence = read_sequence(input)?;
            pending.push(PendingLinkedMesh {
                skin_index,
                slot_index,
                attachment_key: attachment_key.to_string(),
                parent_skin,
                parent_key,
                inherit_timeline,
            });
            Ok(AttachmentData::Mesh(MeshAttachmentData {
                name,
                path,
                color,
                vertices: Vertices::Unweighted(Vec::new()),
                uvs: Vec::new(),
                triangles: Vec::new(),
                hull_length: 0,
                edges: Vec::new(),
                width,
                height,
                sequence,
                parent: None,
                timeline_skin: skin_name.to_string(),
                timeline_attachment: attachment_key.to_string(),
            }))
        }
        4 => {
            // Path.
            let closed = input.read_bool()?;
            let constant_speed = input.read_bool()?;
            let vertex_count = input.read_count("vertex")?;
            let vertices = super::read_vertices(input, vertex_count, data.bones.len(), scale)?;
            let lengths = input.read_float_array(vertex_count / 3, scale)?;
            let color = if nonessential {
                Some(input.read_color_rgba()?)
            } else {
                None
            };
            Ok(AttachmentData::Path(PathAttachmentData {
                name,
                closed,
                constant_speed,
                vertices,
                lengths,
                color,
            }))
        }
        5 => {
            // Point.
            let rotation = input.read_f32_be()?;
            let x = input.read_f32_be()? * scale;
            let y = input.read_f32_be()? * scale;
            let color = if nonessential {
                Some(input.read_color_rgba()?)
            } else {
                None
            };
            Ok(AttachmentData::Point(PointAttachmentData {
                name,
                x,
                y,
                rotation,
                color,
            }))
        }
        6 => {
            // Clipping.
            let end_slot = input.read_index(data.slots.len(), "clipping end slot")?;
            let vertex_count = input.read_count("vertex")?;
            let vertices = super::read_vertices(input, vertex_count, data.bones.len(), scale)?;
            let color = if nonessential {
                Some(input.read_color_rgba()?)
            } else {
                None
            };
            Ok(AttachmentData::Clipping(ClippingAttachmentData {
                name,
                end_slot,
                vertices,
                color,
            }))
        }
        other => Err(Error::BinaryParse {
            message: format!("unsupported attachment type {other}"),
        }),
    }
}

fn read_animation(
    input: &mut BinaryInput<'_>,
    name: String,
    data: &SkeletonData,
    strings: &[String],
    scale: f32,
) -> Result<Animation, Error> {
    let _num_timelines = input.read_varint(true)?;
    let mut duration = 0.0f32;

    // Slot timelines.
    let mut slot_timelines = Vec::new();
    for _ in 0..input.read_count("slot timeline subject")? {
        let slot_index = input.read_index(data.slots.len(), "slot timeline")?;
        for _ in 0..input.read_count("slot timeline")? {
            let timeline_type = input.read_u8()?;
            let frame_count = input.read_count("frame")?;
            if timeline_type == SLOT_ATTACHMENT {
                let mut frames = Vec::with_capacity(frame_count);
                for _ in 0..frame_count {
                    let time = input.read_f32_be()?;
                    duration = duration.max(time);
                    let name = input.read_string_ref(strings)?;
                    frames.push(AttachmentFrame { time, name });
                }
                slot_timelines.push(SlotTimeline::Attachment(AttachmentTimeline {
                    slot_index,
                    frames,
                }));
                continue;
            }
            let _bezier_count = input.read_count("bezier")?;
            let timeline = match timeline_type {
                SLOT_RGBA => SlotTimeline::Rgba(read_rgba_timeline(
                    input,
                    frame_count,
                    slot_index,
                    &mut duration,
                )?),
                SLOT_RGB => SlotTimeline::Rgb(read_rgb_timeline(
                    input,
                    frame_count,
                    slot_index,
                    &mut duration,
                )?),
                SLOT_RGBA2 => SlotTimeline::Rgba2(read_rgba2_timeline(
                    input,
                    frame_count,
                    slot_index,
                    &mut duration,
                )?),
                SLOT_RGB2 => SlotTimeline::Rgb2(read_rgb2_timeline(
                    input,
                    frame_count,
                    slot_index,
                    &mut duration,
                )?),
                SLOT_ALPHA => SlotTimeline::Alpha(read_alpha_timeline(
                    input,
                    frame_count,
                    slot_index,
                    &mut duration,
                )?),
                other => {
                    return Err(Error::BinaryParse {
                        message: format!("invalid slot timeline type {other}"),
                    });
                }
            };
            slot_timelines.push(timeline);
        }
    }

    // Bone timelines.
    let mut bone_timelines = Vec::new();
    for _ in 0..input.read_count("bone timeline subject")? {
        let bone_index = input.read_index(data.bones.len(), "bone timeline")?;
        for _ in 0..input.read_count("bone timeline")? {
            let timeline_type = input.read_u8()?;
            let frame_count = input.read_count("frame")?;
            if timeline_type == BONE_INHERIT {
                let mut frames = Vec::with_capacity(frame_count);
                for _ in 0..frame_count {
                    let time = input.read_f32_be()?;
                    duration = duration.max(time);
                    let inherit = super::map_inherit(input.read_u8()? as i32);
                    frames.push(InheritFrame { time, inherit });
                }
                bone_timelines.push(BoneTimeline::Inherit(InheritTimeline {
                    bone_index,
                    frames,
                }));
                continue;
            }
            let _bezier_count = input.read_count("bezier")?;
            let timeline = match timeline_type {
                BONE_ROTATE => BoneTimeline::Rotate(RotateTimeline {
                    bone_index,
                    frames: read_rotate_timeline(input, frame_count, &mut duration)?,
                }),
                BONE_TRANSLATE => BoneTimeline::Translate(TranslateTimeline {
                    bone_index,
                    frames: read_timeline2(input, frame_count, scale, &mut duration)?,
                }),
                BONE_TRANSLATEX => BoneTimeline::TranslateX(TranslateXTimeline {
                    bone_index,
                    frames: read_timeline1(input, frame_count, scale, &mut duration)?,
                }),
                BONE_TRANSLATEY => BoneTimeline::TranslateY(TranslateYTimeline {
                    bone_index,
                    frames: read_timeline1(input, frame_count, scale, &mut duration)?,
                }),
                BONE_SCALE => BoneTimeline::Scale(ScaleTimeline {
                    bone_index,
                    frames: read_timeline2(input, frame_count, 1.0, &mut duration)?,
                }),
                BONE_SCALEX => BoneTimeline::ScaleX(ScaleXTimeline {
                    bone_index,
                    frames: read_timeline1(input, frame_count, 1.0, &mut duration)?,
                }),
                BONE_SCALEY => BoneTimeline::ScaleY(ScaleYTimeline {
                    bone_index,
                    frames: read_timeline1(input, frame_count, 1.0, &mut duration)?,
                }),
                BONE_SHEAR => BoneTimeline::Shear(ShearTimeline {
                    bone_index,
                    frames: read_timeline2(input, frame_count, 1.0, &mut duration)?,
                }),
                BONE_SHEARX => BoneTimeline::ShearX(ShearXTimeline {
                    bone_index,
                    frames: read_timeline1(input, frame_count, 1.0, &mut duration)?,
                }),
                BONE_SHEARY => BoneTimeline::ShearY(ShearYTimeline {
                    bone_index,
                    frames: read_timeline1(input, frame_count, 1.0, &mut duration)?,
                }),
                other => {
                    return Err(Error::BinaryParse {
                        message: format!("invalid bone timeline type {other}"),
                    });
                }
            };
            bone_timelines.push(timeline);
        }
    }

    // IK constraint timelines.
    let mut ik_constraint_timelines = Vec::new();
    for _ in 0..input.read_count("ik timeline")? {
        let constraint_index = input.read_index(data.ik_constraints.len(), "ik timeline")?;
        let frame_count = input.read_count("frame")?;
        let _bezier_count = input.read_count("bezier")?;
        let frames = read_ik_timeline_frames(input, frame_count, scale, &mut duration)?;
        ik_constraint_timelines.push(IkConstraintTimeline {
            constraint_index,
            frames,
        });
    }

    // Transform constraint timelines.
    let mut transform_constraint_timelines = Vec::new();
    for _ in 0..input.read_count("transform timeline")? {
        let constraint_index =
            input.read_index(data.transform_constraints.len(), "transform timeline")?;
        let frame_count = input.read_count("frame")?;
        let _bezier_count = input.read_count("bezier")?;
        let frames = read_transform_timeline_frames(input, frame_count, &mut duration)?;
        transform_constraint_timelines.push(TransformConstraintTimeline {
            constraint_index,
            frames,
        });
    }

    // Path constraint timelines.
    let mut path_constraint_timelines = Vec::new();
    for _ in 0..input.read_count("path timeline subject")? {
        let constraint_index = input.read_index(data.path_constraints.len(), "path timeline")?;
        let constraint = &data.path_constraints[constraint_index];
        for _ in 0..input.read_count("path timeline")? {
            let timeline_type = input.read_i8()?;
            let frame_count = input.read_count("frame")?;
            let _bezier_count = input.read_count("bezier")?;
            let timeline = match timeline_type {
                PATH_POSITION => {
                    let value_scale = if constraint.position_mode == PositionMode::Fixed {
                        scale
                    } else {
                        1.0
                    };
                    PathConstraintTimeline::Position(PathConstraintPositionTimeline {
                        constraint_index,
                        frames: read_timeline1(input, frame_count, value_scale, &mut duration)?,
                    })
                }
                PATH_SPACING => {
                    let value_scale = if matches!(
                        constraint.spacing_mode,
                        SpacingMode::Length | SpacingMode::Fixed
                    ) {
                        scale
                    } else {
                        1.0
                    };
                    PathConstraintTimeline::Spacing(PathConstraintSpacingTimeline {
                        constraint_index,
                        frames: read_timeline1(input, frame_count, value_scale, &mut duration)?,
                    })
                }
                PATH_MIX => PathConstraintTimeline::Mix(PathConstraintMixTimeline {
                    constraint_index,
                    frames: read_path_mix_timeline_frames(input, frame_count, &mut duration)?,
                }),
                other => {
                    return Err(Error::BinaryParse {
                        message: format!("invalid path timeline type {other}"),
                    });
                }
            };
            path_constraint_timelines.push(timeline);
        }
    }

    // Physics constraint timelines. Index 0 targets every constraint and is
    // stored as -1.
    let mut physics_constraint_timelines = Vec::new();
    for _ in 0..input.read_count("physics timeline subject")? {
        let raw_index = input.read_varint(true)?;
        let constraint_index = if raw_index == 0 {
            -1
        } else {
            let index = raw_index - 1;
            if index < 0 || index as usize >= data.physics_constraints.len() {
                return Err(Error::BinaryParse {
                    message: format!(
                        "physics timeline index {index} out of range (len {})",
                        data.physics_constraints.len()
                    ),
                });
            }
            index
        };
        for _ in 0..input.read_count("physics timeline")? {
            let timeline_type = input.read_i8()?;
            let frame_count = input.read_count("frame")?;
            if timeline_type == PHYSICS_RESET {
                let mut frames = Vec::with_capacity(frame_count);
                for _ in 0..frame_count {
                    let time = input.read_f32_be()?;
                    duration = duration.max(time);
                    frames.push(time);
                }
                physics_constraint_timelines.push(PhysicsConstraintTimeline::Reset(
                    PhysicsConstraintResetTimeline {
                        constraint_index,
                        frames,
                    },
                ));
                continue;
            }
            let _bezier_count = input.read_count("bezier")?;
            let timeline = PhysicsConstraintFloatTimeline {
                constraint_index,
                frames: read_timeline1(input, frame_count, 1.0, &mut duration)?,
            };
            physics_constraint_timelines.push(match timeline_type {
                PHYSICS_INERTIA => PhysicsConstraintTimeline::Inertia(timeline),
                PHYSICS_STRENGTH => PhysicsConstraintTimeline::Strength(timeline),
                PHYSICS_DAMPING => PhysicsConstraintTimeline::Damping(timeline),
                PHYSICS_MASS => PhysicsConstraintTimeline::Mass(timeline),
                PHYSICS_WIND => PhysicsConstraintTimeline::Wind(timeline),
                PHYSICS_GRAVITY => PhysicsConstraintTimeline::Gravity(timeline),
                PHYSICS_MIX => PhysicsConstraintTimeline::Mix(timeline),
                other => {
                    return Err(Error::BinaryParse {
                        message: format!("invalid physics timeline type {other}"),
                    });
                }
            });
        }
    }

    // Attachment timelines (deform and sequence).
    let mut deform_timelines = Vec::new();
    let mut sequence_timelines = Vec::new();
    for _ in 0..input.read_count("attachment timeline skin")? {
        let skin_index = input.read_index(data.skins.len(), "attachment timeline skin")?;
        for _ in 0..input.read_count("attachment timeline slot")? {
            let slot_index = input.read_index(data.slots.len(), "attachment timeline slot")?;
            for _ in 0..input.read_count("attachment timeline")? {
                let attachment_name =
                    input
                        .read_string_ref(strings)?
                        .ok_or_else(|| Error::BinaryParse {
                            message: "missing attachment timeline attachment name".to_string(),
                        })?;
                let timeline_type = input.read_u8()?;
                let frame_count = input.read_count("frame")?;
                match timeline_type {
                    ATTACHMENT_DEFORM => {
                        let (deform_length, setup) =
                            super::deform_target(data, skin_index, slot_index, &attachment_name)?;
                        let _bezier_count = input.read_count("bezier")?;
                        deform_timelines.push(read_deform_timeline(
                            input,
                            frame_count,
                            data.skins[skin_index].name.clone(),
                            slot_index,
                            attachment_name,
                            deform_length,
                            setup.as_deref(),
                            scale,
                            &mut duration,
                        )?);
                    }
                    ATTACHMENT_SEQUENCE => {
                        let mut frames = Vec::with_capacity(frame_count);
                        for _ in 0..frame_count {
                            let time = input.read_f32_be()?;
                            duration = duration.max(time);
                            let mode_and_index = input.read_i32_be()?;
                            let delay = input.read_f32_be()?;
                            frames.push(SequenceFrame {
                                time,
                                mode: super::map_sequence_mode(mode_and_index & 0xF)?,
                                index: mode_and_index >> 4,
                                delay,
                            });
                        }
                        sequence_timelines.push(SequenceTimeline {
                            skin: data.skins[skin_index].name.clone(),
                            slot_index,
                            attachment: attachment_name,
                            frames,
                        });
                    }
                    other => {
                        return Err(Error::BinaryParse {
                            message: format!("invalid attachment timeline type {other}"),
                        });
                    }
                }
            }
        }
    }

    // Draw order timeline.
    let draw_order_count = input.read_count("draw order frame")?;
    let draw_order_timeline = if draw_order_count > 0 {
        Some(super::read_draw_order_timeline(
            input,
            draw_order_count,
            data.slots.len(),
            &mut duration,
        )?)
    } else {
        None
    };

    // Event timeline.
    let event_count = input.read_count("event frame")?;
    let event_timeline = if event_count > 0 {
        Some(super::read_event_timeline(
            input,
            event_count,
            &data.events,
            &mut duration,
        )?)
    } else {
        None
    };

    Ok(Animation {
        name,
        duration,
        slot_timelines,
        bone_timelines,
        ik_constraint_timelines,
        transform_constraint_timelines,
        path_constraint_timelines,
        physics_constraint_timelines,
        deform_timelines,
        sequence_timelines,
        draw_order_timeline,
        event_timeline,
    })
}
