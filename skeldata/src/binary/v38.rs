//! Binary reader for 3.8 exports.
//!
//! The legacy encoding differs from 4.x throughout: packed int32 colors on
//! slot timelines, a trailing curve byte per frame instead of the
//! leading-value layout, combined translate/scale/shear mixes on transform
//! constraints, and editor-only attachment colors stored as raw int32s.

use super::{BinaryInput, PendingLinkedMesh, v40};
use crate::{
    Animation, AttachmentData, AttachmentFrame, AttachmentTimeline, BoneData, BoneTimeline,
    BoundingBoxAttachmentData, ClippingAttachmentData, ColorFrame, Curve, DeformFrame,
    DeformTimeline, Error, IkConstraintTimeline, IkFrame, MeshAttachmentData, PathAttachmentData,
    PathConstraintMixTimeline, PathConstraintPositionTimeline, PathConstraintSpacingTimeline,
    PathConstraintTimeline, PathMixFrame, PointAttachmentData, PositionMode, RegionAttachmentData,
    Rgba2Frame, Rgba2Timeline, RotateFrame, RotateTimeline, ScaleTimeline, ShearTimeline,
    SkeletonData, SkinData, SlotData, SlotTimeline, SpacingMode, TransformConstraintData,
    TransformConstraintTimeline, TransformFrame, TranslateTimeline, Vec2Frame, Vertices,
};

const SLOT_ATTACHMENT: u8 = 0;
const SLOT_COLOR: u8 = 1;
const SLOT_TWO_COLOR: u8 = 2;

const BONE_ROTATE: u8 = 0;
const BONE_TRANSLATE: u8 = 1;
const BONE_SCALE: u8 = 2;
const BONE_SHEAR: u8 = 3;

const PATH_POSITION: i8 = 0;
const PATH_SPACING: i8 = 1;
const PATH_MIX: i8 = 2;

pub(super) fn read_skeleton(
    input: &mut BinaryInput<'_>,
    mut data: SkeletonData,
    scale: f32,
) -> Result<SkeletonData, Error> {
    data.x = input.read_f32_be()?;
    data.y = input.read_f32_be()?;
    data.width = input.read_f32_be()?;
    data.height = input.read_f32_be()?;

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
        if nonessential {
            // Packed bone color, not preserved by 3.8 loaders.
            let _ = input.read_i32_be()?;
        }
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
            color: None,
        });
    }

    // Slots.
    let slots_count = input.read_count("slot")?;
    for _ in 0..slots_count {
        let name = input.read_string()?.unwrap_or_default();
        let bone = input.read_index(data.bones.len(), "slot bone")?;
        let color = input.read_color_rgba()?;

        // Dark color in RGBA byte order (4.0 switched to ARGB); the all-0xFF
        // sentinel means no tint in both.
        let r = input.read_u8()?;
        let g = input.read_u8()?;
        let b = input.read_u8()?;
        let a = input.read_u8()?;
        let dark_color = if r == 0xff && g == 0xff && b == 0xff && a == 0xff {
            None
        } else {
            Some([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
        };

        let attachment = input.read_string_ref(&strings)?;
        let blend = super::map_blend(input.read_varint(true)?);
        data.slots.push(SlotData {
            name,
            bone,
            attachment,
            color,
            dark_color,
            blend,
        });
    }

    v40::read_ik_constraints(input, &mut data, scale)?;
    read_transform_constraints(input, &mut data, scale)?;
    v40::read_path_constraints(input, &mut data, scale)?;

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

    data.events = super::read_event_data(input, &strings, true)?;

    let animations_count = input.read_count("animation")?;
    for _ in 0..animations_count {
        let name = input.read_string()?.unwrap_or_default();
        let animation = read_animation(input, name, &data, &strings, scale)?;
        data.animations.push(animation);
    }

    Ok(data)
}

/// 3.8 stores one translate mix and one scale mix; each is broadcast to its
/// x/y pair.
fn read_transform_constraints(
    input: &mut BinaryInput<'_>,
    data: &mut SkeletonData,
    scale: f32,
) -> Result<(), Error> {
    let count = input.read_count("transform constraint")?;
    for _ in 0..count {
        let name = input.read_string()?.unwrap_or_default();
        let order = input.read_varint(true)?;
        let skin_required = input.read_bool()?;
        let bones_count = input.read_count("transform constraint bone")?;
        let mut bones = Vec::with_capacity(bones_count);
        for _ in 0..bones_count {
            bones.push(input.read_index(data.bones.len(), "transform constraint bone")?);
        }
        let target = input.read_index(data.bones.len(), "transform constraint target")?;
        let local = input.read_bool()?;
        let relative = input.read_bool()?;
        let offset_rotation = input.read_f32_be()?;
        let offset_x = input.read_f32_be()? * scale;
        let offset_y = input.read_f32_be()? * scale;
        let offset_scale_x = input.read_f32_be()?;
        let offset_scale_y = input.read_f32_be()?;
        let offset_shear_y = input.read_f32_be()?;
        let mix_rotate = input.read_f32_be()?;
        let mix_translate = input.read_f32_be()?;
        let mix_scale = input.read_f32_be()?;
        let mix_shear_y = input.read_f32_be()?;
        data.transform_constraints.push(TransformConstraintData {
            name,
            order,
            skin_required,
            bones,
            target,
            local,
            relative,
            offset_rotation,
            offset_x,
            offset_y,
            offset_scale_x,
            offset_scale_y,
            offset_shear_y,
            mix_rotate,
            mix_x: mix_translate,
            mix_y: mix_translate,
            mix_scale_x: mix_scale,
            mix_scale_y: mix_scale,
            mix_shear_y,
        });
    }
    Ok(())
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
                sequence: None,
            }))
        }
        1 => {
            // Bounding box.
            let vertex_count = input.read_count("vertex")?;
            let vertices = super::read_vertices(input, vertex_count, data.bones.len(), scale)?;
            if nonessential {
                let _ = input.read_i32_be()?;
            }
            Ok(AttachmentData::BoundingBox(BoundingBoxAttachmentData {
                name,
                vertices,
                color: None,
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
                sequence: None,
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
                sequence: None,
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
            if nonessential {
                let _ = input.read_i32_be()?;
            }
            Ok(AttachmentData::Path(PathAttachmentData {
                name,
                closed,
                constant_speed,
                vertices,
                lengths,
                color: None,
            }))
        }
        5 => {
            // Point.
            let rotation = input.read_f32_be()?;
            let x = input.read_f32_be()? * scale;
            let y = input.read_f32_be()? * scale;
            if nonessential {
                let _ = input.read_i32_be()?;
            }
            Ok(AttachmentData::Point(PointAttachmentData {
                name,
                x,
                y,
                rotation,
                color: None,
            }))
        }
        6 => {
            // Clipping.
            let end_slot = input.read_index(data.slots.len(), "clipping end slot")?;
            let vertex_count = input.read_count("vertex")?;
            let vertices = super::read_vertices(input, vertex_count, data.bones.len(), scale)?;
            if nonessential {
                let _ = input.read_i32_be()?;
            }
            Ok(AttachmentData::Clipping(ClippingAttachmentData {
                name,
                end_slot,
                vertices,
                color: None,
            }))
        }
        other => Err(Error::BinaryParse {
            message: format!("unsupported attachment type {other}"),
        }),
    }
}

/// Legacy curve byte, trailing each non-final frame: 0 linear (nothing
/// follows), 1 stepped, 2 Bezier with four raw control floats.
fn read_curve(input: &mut BinaryInput<'_>) -> Result<Curve, Error> {
    match input.read_u8()? {
        0 => Ok(Curve::Linear),
        1 => Ok(Curve::Stepped),
        2 => {
            let cx1 = input.read_f32_be()?;
            let cy1 = input.read_f32_be()?;
            let cx2 = input.read_f32_be()?;
            let cy2 = input.read_f32_be()?;
            Ok(Curve::Bezier { cx1, cy1, cx2, cy2 })
        }
        other => Err(Error::BinaryParse {
            message: format!("invalid curve type {other}"),
        }),
    }
}

fn unpack_rgba(color: i32) -> [f32; 4] {
    [
        ((color >> 24) & 0xff) as f32 / 255.0,
        ((color >> 16) & 0xff) as f32 / 255.0,
        ((color >> 8) & 0xff) as f32 / 255.0,
        (color & 0xff) as f32 / 255.0,
    ]
}

fn unpack_rgb(color: i32) -> [f32; 3] {
    [
        ((color >> 16) & 0xff) as f32 / 255.0,
        ((color >> 8) & 0xff) as f32 / 255.0,
        (color & 0xff) as f32 / 255.0,
    ]
}

fn read_animation(
    input: &mut BinaryInput<'_>,
    name: String,
    data: &SkeletonData,
    strings: &[String],
    scale: f32,
) -> Result<Animation, Error> {
    let mut duration = 0.0f32;

    // Slot timelines.
    let mut slot_timelines = Vec::new();
    for _ in 0..input.read_count("slot timeline subject")? {
        let slot_index = input.read_index(data.slots.len(), "slot timeline")?;
        for _ in 0..input.read_count("slot timeline")? {
            let timeline_type = input.read_u8()?;
            let frame_count = input.read_count("frame")?;
            let frame_last = frame_count.saturating_sub(1);
            match timeline_type {
                SLOT_ATTACHMENT => {
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
                }
                SLOT_COLOR => {
                    let mut frames = Vec::with_capacity(frame_count);
                    for frame in 0..frame_count {
                        let time = input.read_f32_be()?;
                        duration = duration.max(time);
                        let color = unpack_rgba(input.read_i32_be()?);
                        let curve = if frame < frame_last {
                            read_curve(input)?
                        } else {
                            Curve::Linear
                        };
                        frames.push(ColorFrame {
                            time,
                            color,
                            curve: [curve; 4],
                        });
                    }
                    slot_timelines.push(SlotTimeline::Rgba(crate::RgbaTimeline {
                        slot_index,
                        frames,
                    }));
                }
                SLOT_TWO_COLOR => {
                    let mut frames = Vec::with_capacity(frame_count);
                    for frame in 0..frame_count {
                        let time = input.read_f32_be()?;
                        duration = duration.max(time);
                        let light = unpack_rgba(input.read_i32_be()?);
                        let dark = unpack_rgb(input.read_i32_be()?);
                        let curve = if frame < frame_last {
                            read_curve(input)?
                        } else {
                            Curve::Linear
                        };
                        frames.push(Rgba2Frame {
                            time,
                            light,
                            dark,
                            curve: [curve; 7],
                        });
                    }
                    slot_timelines.push(SlotTimeline::Rgba2(Rgba2Timeline {
                        slot_index,
                        frames,
                    }));
                }
                other => {
                    return Err(Error::BinaryParse {
                        message: format!("invalid slot timeline type {other}"),
                    });
                }
            }
        }
    }

    // Bone timelines.
    let mut bone_timelines = Vec::new();
    for _ in 0..input.read_count("bone timeline subject")? {
        let bone_index = input.read_index(data.bones.len(), "bone timeline")?;
        for _ in 0..input.read_count("bone timeline")? {
            let timeline_type = input.read_u8()?;
            let frame_count = input.read_count("frame")?;
            let frame_last = frame_count.saturating_sub(1);
            match timeline_type {
                BONE_ROTATE => {
                    let mut frames = Vec::with_capacity(frame_count);
                    for frame in 0..frame_count {
                        let time = input.read_f32_be()?;
                        duration = duration.max(time);
                        let angle = input.read_f32_be()?;
                        let curve = if frame < frame_last {
                            read_curve(input)?
                        } else {
                            Curve::Linear
                        };
                        frames.push(RotateFrame { time, angle, curve });
                    }
                    bone_timelines
                        .push(BoneTimeline::Rotate(RotateTimeline { bone_index, frames }));
                }
                BONE_TRANSLATE | BONE_SCALE | BONE_SHEAR => {
                    let timeline_scale = if timeline_type == BONE_TRANSLATE {
                        scale
                    } else {
                        1.0
                    };
                    let mut frames = Vec::with_capacity(frame_count);
                    for frame in 0..frame_count {
                        let time = input.read_f32_be()?;
                        duration = duration.max(time);
                        let x = input.read_f32_be()? * timeline_scale;
                        let y = input.read_f32_be()? * timeline_scale;
                        let curve = if frame < frame_last {
                            read_curve(input)?
                        } else {
                            Curve::Linear
                        };
                        frames.push(Vec2Frame {
                            time,
                            x,
                            y,
                            curve: [curve; 2],
                        });
                    }
                    bone_timelines.push(match timeline_type {
                        BONE_TRANSLATE => {
                            BoneTimeline::Translate(TranslateTimeline { bone_index, frames })
                        }
                        BONE_SCALE => BoneTimeline::Scale(ScaleTimeline { bone_index, frames }),
                        _ => BoneTimeline::Shear(ShearTimeline { bone_index, frames }),
                    });
                }
                other => {
                    return Err(Error::BinaryParse {
                        message: format!("invalid bone timeline type {other}"),
                    });
                }
            }
        }
    }

    // IK constraint timelines.
    let mut ik_constraint_timelines = Vec::new();
    for _ in 0..input.read_count("ik timeline")? {
        let constraint_index = input.read_index(data.ik_constraints.len(), "ik timeline")?;
        let frame_count = input.read_count("frame")?;
        let frame_last = frame_count.saturating_sub(1);
        let mut frames = Vec::with_capacity(frame_count);
        for frame in 0..frame_count {
            let time = input.read_f32_be()?;
            duration = duration.max(time);
            let mix = input.read_f32_be()?;
            let softness = input.read_f32_be()? * scale;
            let bend_direction = input.read_i8()? as i32;
            let compress = input.read_bool()?;
            let stretch = input.read_bool()?;
            let curve = if frame < frame_last {
                read_curve(input)?
            } else {
                Curve::Linear
            };
            frames.push(IkFrame {
                time,
                mix,
                softness,
                bend_direction,
                compress,
                stretch,
                curve: [curve; 2],
            });
        }
        ik_constraint_timelines.push(IkConstraintTimeline {
            constraint_index,
            frames,
        });
    }

    // Transform constraint timelines; translate and scale mixes broadcast to
    // their x/y pairs like the setup-pose values.
    let mut transform_constraint_timelines = Vec::new();
    for _ in 0..input.read_count("transform timeline")? {
        let constraint_index =
            input.read_index(data.transform_constraints.len(), "transform timeline")?;
        let frame_count = input.read_count("frame")?;
        let frame_last = frame_count.saturating_sub(1);
        let mut frames = Vec::with_capacity(frame_count);
        for frame in 0..frame_count {
            let time = input.read_f32_be()?;
            duration = duration.max(time);
            let mix_rotate = input.read_f32_be()?;
            let mix_translate = input.read_f32_be()?;
            let mix_scale = input.read_f32_be()?;
            let mix_shear_y = input.read_f32_be()?;
            let curve = if frame < frame_last {
                read_curve(input)?
            } else {
                Curve::Linear
            };
            frames.push(TransformFrame {
                time,
                mix_rotate,
                mix_x: mix_translate,
                mix_y: mix_translate,
                mix_scale_x: mix_scale,
                mix_scale_y: mix_scale,
                mix_shear_y,
                curve: [curve; 6],
            });
        }
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
            let frame_last = frame_count.saturating_sub(1);
            match timeline_type {
                PATH_POSITION | PATH_SPACING => {
                    let value_scale = if timeline_type == PATH_SPACING {
                        if matches!(
                            constraint.spacing_mode,
                            SpacingMode::Length | SpacingMode::Fixed
                        ) {
                            scale
                        } else {
                            1.0
                        }
                    } else if constraint.position_mode == PositionMode::Fixed {
                        scale
                    } else {
                        1.0
                    };
                    let mut frames = Vec::with_capacity(frame_count);
                    for frame in 0..frame_count {
                        let time = input.read_f32_be()?;
                        duration = duration.max(time);
                        let value = input.read_f32_be()? * value_scale;
                        let curve = if frame < frame_last {
                            read_curve(input)?
                        } else {
                            Curve::Linear
                        };
                        frames.push(crate::FloatFrame { time, value, curve });
                    }
                    path_constraint_timelines.push(if timeline_type == PATH_SPACING {
                        PathConstraintTimeline::Spacing(PathConstraintSpacingTimeline {
                            constraint_index,
                            frames,
                        })
                    } else {
                        PathConstraintTimeline::Position(PathConstraintPositionTimeline {
                            constraint_index,
                            frames,
                        })
                    });
                }
                PATH_MIX => {
                    let mut frames = Vec::with_capacity(frame_count);
                    for frame in 0..frame_count {
                        let time = input.read_f32_be()?;
                        duration = duration.max(time);
                        let mix_rotate = input.read_f32_be()?;
                        let mix_translate = input.read_f32_be()?;
                        let curve = if frame < frame_last {
                            read_curve(input)?
                        } else {
                            Curve::Linear
                        };
                        frames.push(PathMixFrame {
                            time,
                            mix_rotate,
                            mix_x: mix_translate,
                            mix_y: mix_translate,
                            curve: [curve; 3],
                        });
                    }
                    path_constraint_timelines.push(PathConstraintTimeline::Mix(
                        PathConstraintMixTimeline {
                            constraint_index,
                            frames,
                        },
                    ));
                }
                other => {
                    return Err(Error::BinaryParse {
                        message: format!("invalid path timeline type {other}"),
                    });
                }
            }
        }
    }

    // Deform timelines.
    let mut deform_timelines = Vec::new();
    for _ in 0..input.read_count("deform timeline skin")? {
        let skin_index = input.read_index(data.skins.len(), "deform timeline skin")?;
        for _ in 0..input.read_count("deform timeline slot")? {
            let slot_index = input.read_index(data.slots.len(), "deform timeline slot")?;
            for _ in 0..input.read_count("deform timeline")? {
                let attachment_name =
                    input
                        .read_string_ref(strings)?
                        .ok_or_else(|| Error::BinaryParse {
                            message: "missing deform timeline attachment name".to_string(),
                        })?;
                let (deform_length, setup) =
                    super::deform_target(data, skin_index, slot_index, &attachment_name)?;
                let frame_count = input.read_count("frame")?;
                let frame_last = frame_count.saturating_sub(1);
                let mut frames = Vec::with_capacity(frame_count);
                for frame in 0..frame_count {
                    let time = input.read_f32_be()?;
                    duration = duration.max(time);
                    let vertices = super::read_deform_vertices(
                        input,
                        deform_length,
                        setup.as_deref(),
                        scale,
                    )?;
                    let curve = if frame < frame_last {
                        read_curve(input)?
                    } else {
                        Curve::Linear
                    };
                    frames.push(DeformFrame {
                        time,
                        vertices,
                        curve,
                    });
                }
                deform_timelines.push(DeformTimeline {
                    skin: data.skins[skin_index].name.clone(),
                    slot_index,
                    attachment: attachment_name,
                    frames,
                });
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
        physics_constraint_timelines: Vec::new(),
        deform_timelines,
        sequence_timelines: Vec::new(),
        draw_order_timeline,
        event_timeline,
    })
}
