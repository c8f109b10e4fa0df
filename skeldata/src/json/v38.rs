//! JSON reader for 3.8 exports.
//!
//! Keys and shapes predate the 4.0 overhaul: packed `color`/`twoColor` slot
//! timelines, two-value bone timelines only, combined translate/scale mixes
//! on transform constraints, the bare-number-plus-`c2`..`c4` curve shape and
//! a `deform` (rather than `attachments`) animation section.

use super::{
    AnimationDef, AttachmentAnimDef, BoneAnimDef, LinkedMeshRef, Root, SlotAnimDef,
    parse_color_rgb, parse_color_rgba, parse_curve_38, parse_position_mode, parse_rotate_mode,
    parse_spacing_mode, v4x,
};
use crate::{
    Animation, AttachmentFrame, AttachmentTimeline, BoneTimeline, ColorFrame, DeformFrame,
    DeformTimeline, Error, IkConstraintData, IkConstraintTimeline, IkFrame,
    PathConstraintData, PathConstraintMixTimeline, PathConstraintPositionTimeline,
    PathConstraintSpacingTimeline, PathConstraintTimeline, PathMixFrame, PositionMode, Rgba2Frame,
    Rgba2Timeline, RgbaTimeline, RotateFrame, RotateTimeline, ScaleTimeline, ShearTimeline,
    SkeletonData, SlotTimeline, SpacingMode, TransformConstraintData,
    TransformConstraintTimeline, TransformFrame, TranslateTimeline, Vec2Frame,
};
use std::collections::HashMap;

pub(super) fn read_skeleton(
    root: Root,
    mut data: SkeletonData,
    scale: f32,
    bone_index: HashMap<String, usize>,
    slot_index: HashMap<String, usize>,
) -> Result<SkeletonData, Error> {
    read_constraints(&root, &mut data, scale, &bone_index, &slot_index)?;

    let mut pending = Vec::<LinkedMeshRef>::new();
    super::read_skins(
        &root,
        &mut data,
        scale,
        false,
        false,
        &bone_index,
        &slot_index,
        &mut pending,
    )?;
    super::resolve_linked_meshes(&mut data, pending)?;
    super::read_events(&root, &mut data);

    for (name, def) in &root.animations.0 {
        let animation = read_animation(name, def, &data, scale, &bone_index, &slot_index)?;
        data.animations.push(animation);
    }
    Ok(data)
}

fn read_constraints(
    root: &Root,
    data: &mut SkeletonData,
    scale: f32,
    bone_index: &HashMap<String, usize>,
    slot_index: &HashMap<String, usize>,
) -> Result<(), Error> {
    let bone = |constraint: &str, name: &str| -> Result<usize, Error> {
        bone_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::JsonUnknownConstraintRef {
                constraint: constraint.to_string(),
                kind: "bone".to_string(),
                referenced: name.to_string(),
            })
    };

    for def in &root.ik {
        let mut bones = Vec::with_capacity(def.bones.len());
        for name in &def.bones {
            bones.push(bone(&def.name, name)?);
        }
        data.ik_constraints.push(IkConstraintData {
            name: def.name.clone(),
            order: def.order,
            skin_required: def.skin_required,
            target: bone(&def.name, &def.target)?,
            bones,
            mix: def.mix,
            softness: def.softness * scale,
            bend_direction: if def.bend_positive { 1 } else { -1 },
            compress: def.compress,
            stretch: def.stretch,
            uniform: def.uniform,
        });
    }

    // Translate and scale mixes are single values broadcast to their x/y
    // pairs; 4.0 split them.
    for def in &root.transform {
        let mut bones = Vec::with_capacity(def.bones.len());
        for name in &def.bones {
            bones.push(bone(&def.name, name)?);
        }
        let mix_translate = def.translate_mix.unwrap_or(1.0);
        let mix_scale = def.scale_mix.unwrap_or(1.0);
        data.transform_constraints.push(TransformConstraintData {
            name: def.name.clone(),
            order: def.order,
            skin_required: def.skin_required,
            target: bone(&def.name, &def.target)?,
            bones,
            local: def.local,
            relative: def.relative,
            offset_rotation: def.rotation,
            offset_x: def.x * scale,
            offset_y: def.y * scale,
            offset_scale_x: def.scale_x,
            offset_scale_y: def.scale_y,
            offset_shear_y: def.shear_y,
            mix_rotate: def.rotate_mix.unwrap_or(1.0),
            mix_x: mix_translate,
            mix_y: mix_translate,
            mix_scale_x: mix_scale,
            mix_scale_y: mix_scale,
            mix_shear_y: def.shear_mix.unwrap_or(1.0),
        });
    }

    for def in &root.path {
        let mut bones = Vec::with_capacity(def.bones.len());
        for name in &def.bones {
            bones.push(bone(&def.name, name)?);
        }
        let target = slot_index.get(&def.target).copied().ok_or_else(|| {
            Error::JsonUnknownConstraintRef {
                constraint: def.name.clone(),
                kind: "slot".to_string(),
                referenced: def.target.clone(),
            }
        })?;
        let position_mode = parse_position_mode(def.position_mode.as_deref());
        let spacing_mode = parse_spacing_mode(def.spacing_mode.as_deref());
        let mut position = def.position;
        if position_mode == PositionMode::Fixed {
            position *= scale;
        }
        let mut spacing = def.spacing;
        if matches!(spacing_mode, SpacingMode::Length | SpacingMode::Fixed) {
            spacing *= scale;
        }
        let mix_translate = def.translate_mix.unwrap_or(1.0);
        data.path_constraints.push(PathConstraintData {
            name: def.name.clone(),
            order: def.order,
            skin_required: def.skin_required,
            target,
            bones,
            position_mode,
            spacing_mode,
            rotate_mode: parse_rotate_mode(def.rotate_mode.as_deref()),
            offset_rotation: def.rotation,
            position,
            spacing,
            mix_rotate: def.rotate_mix.unwrap_or(1.0),
            mix_x: mix_translate,
            mix_y: mix_translate,
        });
    }
    Ok(())
}

fn read_animation(
    name: &str,
    def: &AnimationDef,
    data: &SkeletonData,
    scale: f32,
    bone_index: &HashMap<String, usize>,
    slot_index: &HashMap<String, usize>,
) -> Result<Animation, Error> {
    let mut duration = 0.0f32;

    let mut slot_timelines = Vec::new();
    for (slot_name, anim) in &def.slots.0 {
        let slot =
            *slot_index
                .get(slot_name)
                .ok_or_else(|| Error::JsonUnknownAnimationSlot {
                    animation: name.to_string(),
                    slot: slot_name.clone(),
                })?;
        read_slot_timelines(name, slot_name, slot, anim, &mut slot_timelines, &mut duration)?;
    }

    let mut bone_timelines = Vec::new();
    for (bone_name, anim) in &def.bones.0 {
        let bone =
            *bone_index
                .get(bone_name)
                .ok_or_else(|| Error::JsonUnknownAnimationBone {
                    animation: name.to_string(),
                    bone: bone_name.clone(),
                })?;
        read_bone_timelines(name, bone_name, bone, anim, scale, &mut bone_timelines, &mut duration)?;
    }

    let mut ik_constraint_timelines = Vec::new();
    for (constraint_name, keys) in &def.ik.0 {
        let constraint_index = data
            .ik_constraints
            .iter()
            .position(|c| &c.name == constraint_name)
            .ok_or_else(|| Error::JsonUnknownConstraintTimeline {
                animation: name.to_string(),
                kind: "ik".to_string(),
                constraint: constraint_name.clone(),
            })?;
        let context = format!("animation '{name}' ik '{constraint_name}'");
        let mut frames = Vec::with_capacity(keys.len());
        for key in keys {
            duration = duration.max(key.time);
            frames.push(IkFrame {
                time: key.time,
                mix: key.mix,
                softness: key.softness * scale,
                bend_direction: if key.bend_positive { 1 } else { -1 },
                compress: key.compress,
                stretch: key.stretch,
                curve: [parse_curve_38(&key.curve, &context)?; 2],
            });
        }
        ik_constraint_timelines.push(IkConstraintTimeline {
            constraint_index,
            frames,
        });
    }

    let mut transform_constraint_timelines = Vec::new();
    for (constraint_name, keys) in &def.transform.0 {
        let constraint_index = data
            .transform_constraints
            .iter()
            .position(|c| &c.name == constraint_name)
            .ok_or_else(|| Error::JsonUnknownConstraintTimeline {
                animation: name.to_string(),
                kind: "transform".to_string(),
                constraint: constraint_name.clone(),
            })?;
        let context = format!("animation '{name}' transform '{constraint_name}'");
        let mut frames = Vec::with_capacity(keys.len());
        for key in keys {
            duration = duration.max(key.time);
            let mix_translate = key.translate_mix.unwrap_or(1.0);
            let mix_scale = key.scale_mix.unwrap_or(1.0);
            frames.push(TransformFrame {
                time: key.time,
                mix_rotate: key.rotate_mix.unwrap_or(1.0),
                mix_x: mix_translate,
                mix_y: mix_translate,
                mix_scale_x: mix_scale,
                mix_scale_y: mix_scale,
                mix_shear_y: key.shear_mix.unwrap_or(1.0),
                curve: [parse_curve_38(&key.curve, &context)?; 6],
            });
        }
        transform_constraint_timelines.push(TransformConstraintTimeline {
            constraint_index,
            frames,
        });
    }

    let mut path_constraint_timelines = Vec::new();
    for (constraint_name, timelines) in &def.path.0 {
        let constraint_index = data
            .path_constraints
            .iter()
            .position(|c| &c.name == constraint_name)
            .ok_or_else(|| Error::JsonUnknownConstraintTimeline {
                animation: name.to_string(),
                kind: "path".to_string(),
                constraint: constraint_name.clone(),
            })?;
        let constraint = &data.path_constraints[constraint_index];
        for (timeline_name, keys) in &timelines.0 {
            let context = format!("animation '{name}' path '{constraint_name}' {timeline_name}");
            match timeline_name.as_str() {
                "position" | "spacing" => {
                    let value_scale = if timeline_name == "position" {
                        if constraint.position_mode == PositionMode::Fixed {
                            scale
                        } else {
                            1.0
                        }
                    } else if matches!(
                        constraint.spacing_mode,
                        SpacingMode::Length | SpacingMode::Fixed
                    ) {
                        scale
                    } else {
                        1.0
                    };
                    let mut frames = Vec::with_capacity(keys.len());
                    for key in keys {
                        duration = duration.max(key.time);
                        let raw = if timeline_name == "position" {
                            key.position
                        } else {
                            key.spacing
                        }
                        .or(key.value)
                        .unwrap_or(0.0);
                        frames.push(crate::FloatFrame {
                            time: key.time,
                            value: raw * value_scale,
                            curve: parse_curve_38(&key.curve, &context)?,
                        });
                    }
                    path_constraint_timelines.push(if timeline_name == "position" {
                        PathConstraintTimeline::Position(PathConstraintPositionTimeline {
                            constraint_index,
                            frames,
                        })
                    } else {
                        PathConstraintTimeline::Spacing(PathConstraintSpacingTimeline {
                            constraint_index,
                            frames,
                        })
                    });
                }
                "mix" => {
                    let mut frames = Vec::with_capacity(keys.len());
                    for key in keys {
                        duration = duration.max(key.time);
                        let mix_translate = key.translate_mix.unwrap_or(1.0);
                        frames.push(PathMixFrame {
                            time: key.time,
                            mix_rotate: key.rotate_mix.unwrap_or(1.0),
                            mix_x: mix_translate,
                            mix_y: mix_translate,
                            curve: [parse_curve_38(&key.curve, &context)?; 3],
                        });
                    }
                    path_constraint_timelines.push(PathConstraintTimeline::Mix(
                        PathConstraintMixTimeline {
                            constraint_index,
                            frames,
                        },
                    ));
                }
                _ => {}
            }
        }
    }

    let mut deform_timelines = Vec::new();
    for (skin_name, slots) in &def.attachments.0 {
        for (slot_name, attachments) in &slots.0 {
            let slot =
                *slot_index
                    .get(slot_name)
                    .ok_or_else(|| Error::JsonUnknownAnimationSlot {
                        animation: name.to_string(),
                        slot: slot_name.clone(),
                    })?;
            for (attachment_name, anim) in &attachments.0 {
                let keys = match anim {
                    AttachmentAnimDef::Direct(keys) => keys.as_slice(),
                    AttachmentAnimDef::Timelines { deform, .. } => deform.as_slice(),
                };
                if keys.is_empty() {
                    continue;
                }
                let vertices =
                    super::deform_target(data, name, skin_name, slot, attachment_name)?;
                let (deform_length, setup) = vertices.deform_setup();
                let context = format!("animation '{name}' deform '{attachment_name}'");
                let invalid = |message: String| Error::JsonInvalidAttachmentData {
                    skin: skin_name.clone(),
                    slot: slot_name.clone(),
                    attachment: attachment_name.clone(),
                    message,
                };
                let mut frames = Vec::with_capacity(keys.len());
                for key in keys {
                    duration = duration.max(key.time);
                    frames.push(DeformFrame {
                        time: key.time,
                        vertices: super::deform_frame_values(
                            key,
                            deform_length,
                            setup.as_deref(),
                            scale,
                            &invalid,
                        )?,
                        curve: parse_curve_38(&key.curve, &context)?,
                    });
                }
                deform_timelines.push(DeformTimeline {
                    skin: skin_name.clone(),
                    slot_index: slot,
                    attachment: attachment_name.clone(),
                    frames,
                });
            }
        }
    }

    let draw_order_timeline = v4x::read_draw_order_timeline(
        name,
        &def.draw_order,
        slot_index,
        data.slots.len(),
        &mut duration,
    )?;
    let event_timeline = v4x::read_event_timeline(name, &def.events, data, &mut duration)?;

    Ok(Animation {
        name: name.to_string(),
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

fn read_slot_timelines(
    animation: &str,
    slot_name: &str,
    slot_index: usize,
    anim: &SlotAnimDef,
    out: &mut Vec<SlotTimeline>,
    duration: &mut f32,
) -> Result<(), Error> {
    if !anim.attachment.is_empty() {
        let mut frames = Vec::with_capacity(anim.attachment.len());
        for key in &anim.attachment {
            *duration = duration.max(key.time);
            frames.push(AttachmentFrame {
                time: key.time,
                name: key.name.clone(),
            });
        }
        out.push(SlotTimeline::Attachment(AttachmentTimeline {
            slot_index,
            frames,
        }));
    }

    if !anim.color.is_empty() {
        let context = format!("animation '{animation}' slot '{slot_name}' color");
        let mut frames = Vec::with_capacity(anim.color.len());
        for key in &anim.color {
            *duration = duration.max(key.time);
            let color = parse_color_rgba(key.color.as_deref().unwrap_or("ffffffff"), &context)?;
            frames.push(ColorFrame {
                time: key.time,
                color,
                curve: [parse_curve_38(&key.curve, &context)?; 4],
            });
        }
        out.push(SlotTimeline::Rgba(RgbaTimeline { slot_index, frames }));
    }

    if !anim.two_color.is_empty() {
        let context = format!("animation '{animation}' slot '{slot_name}' twoColor");
        let mut frames = Vec::with_capacity(anim.two_color.len());
        for key in &anim.two_color {
            *duration = duration.max(key.time);
            frames.push(Rgba2Frame {
                time: key.time,
                light: parse_color_rgba(key.light.as_deref().unwrap_or("ffffffff"), &context)?,
                dark: parse_color_rgb(key.dark.as_deref().unwrap_or("ffffff"), &context)?,
                curve: [parse_curve_38(&key.curve, &context)?; 7],
            });
        }
        out.push(SlotTimeline::Rgba2(Rgba2Timeline { slot_index, frames }));
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn read_bone_timelines(
    animation: &str,
    bone_name: &str,
    bone_index: usize,
    anim: &BoneAnimDef,
    scale: f32,
    out: &mut Vec<BoneTimeline>,
    duration: &mut f32,
) -> Result<(), Error> {
    let context = |timeline: &str| format!("animation '{animation}' bone '{bone_name}' {timeline}");

    if !anim.rotate.is_empty() {
        let context = context("rotate");
        let mut frames = Vec::with_capacity(anim.rotate.len());
        for key in &anim.rotate {
            *duration = duration.max(key.time);
            frames.push(RotateFrame {
                time: key.time,
                angle: key.angle.or(key.value).unwrap_or(0.0),
                curve: parse_curve_38(&key.curve, &context)?,
            });
        }
        out.push(BoneTimeline::Rotate(RotateTimeline { bone_index, frames }));
    }

    let mut two_value = |keys: &[super::Vec2Key],
                         default_value: f32,
                         value_scale: f32,
                         context: String|
     -> Result<Vec<Vec2Frame>, Error> {
        let mut frames = Vec::with_capacity(keys.len());
        for key in keys {
            *duration = duration.max(key.time);
            frames.push(Vec2Frame {
                time: key.time,
                x: key.x.unwrap_or(default_value) * value_scale,
                y: key.y.unwrap_or(default_value) * value_scale,
                curve: [parse_curve_38(&key.curve, &context)?; 2],
            });
        }
        Ok(frames)
    };

    if !anim.translate.is_empty() {
        let frames = two_value(&anim.translate, 0.0, scale, context("translate"))?;
        out.push(BoneTimeline::Translate(TranslateTimeline {
            bone_index,
            frames,
        }));
    }
    if !anim.scale.is_empty() {
        let frames = two_value(&anim.scale, 1.0, 1.0, context("scale"))?;
        out.push(BoneTimeline::Scale(ScaleTimeline { bone_index, frames }));
    }
    if !anim.shear.is_empty() {
        let frames = two_value(&anim.shear, 0.0, 1.0, context("shear"))?;
        out.push(BoneTimeline::Shear(ShearTimeline { bone_index, frames }));
    }
    Ok(())
}
