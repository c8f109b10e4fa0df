//! JSON reader for 4.x exports. 4.0 and 4.1/4.2 documents share the key
//! layout; sequences, physics constraints and inherit timelines only appear
//! when the 4.2 reader was selected.

use super::{
    AnimationDef, AttachmentAnimDef, BoneAnimDef, LinkedMeshRef, Root, SlotAnimDef,
    parse_color_rgb, parse_color_rgba, parse_curve_4x, parse_curve_4x_1, parse_inherit,
    parse_position_mode, parse_rotate_mode, parse_sequence_mode, parse_spacing_mode,
};
use crate::{
    AlphaFrame, AlphaTimeline, Animation, AttachmentFrame, AttachmentTimeline, BoneTimeline,
    ColorFrame, DeformFrame, DeformTimeline, DrawOrderFrame, DrawOrderTimeline, Error,
    Event, EventTimeline, FloatFrame, FormatVersion, IkConstraintData, IkConstraintTimeline,
    IkFrame, InheritFrame, InheritTimeline, PathConstraintData, PathConstraintMixTimeline,
    PathConstraintPositionTimeline, PathConstraintSpacingTimeline, PathConstraintTimeline,
    PathMixFrame, PhysicsConstraintData, PhysicsConstraintFloatTimeline,
    PhysicsConstraintResetTimeline, PhysicsConstraintTimeline, PositionMode, Rgb2Frame,
    Rgb2Timeline, RgbFrame, RgbTimeline, Rgba2Frame, Rgba2Timeline, RgbaTimeline, RotateFrame,
    RotateTimeline, ScaleTimeline, ScaleXTimeline, ScaleYTimeline, SequenceFrame,
    SequenceTimeline, ShearTimeline, ShearXTimeline, ShearYTimeline, SkeletonData, SlotTimeline,
    SpacingMode, TransformConstraintData, TransformConstraintTimeline, TransformFrame,
    TranslateTimeline, TranslateXTimeline, TranslateYTimeline, Vec2Frame,
};
use std::collections::HashMap;

pub(super) fn read_skeleton(
    root: Root,
    mut data: SkeletonData,
    scale: f32,
    format: FormatVersion,
    bone_index: HashMap<String, usize>,
    slot_index: HashMap<String, usize>,
) -> Result<SkeletonData, Error> {
    read_constraints(&root, &mut data, scale, format, &bone_index, &slot_index)?;

    let mut pending = Vec::<LinkedMeshRef>::new();
    super::read_skins(
        &root,
        &mut data,
        scale,
        format.has_physics(),
        format.has_physics(),
        &bone_index,
        &slot_index,
        &mut pending,
    )?;
    super::resolve_linked_meshes(&mut data, pending)?;
    super::read_events(&root, &mut data);

    for (name, def) in &root.animations.0 {
        let animation = read_animation(name, def, &data, scale, format, &bone_index, &slot_index)?;
        data.animations.push(animation);
    }
    Ok(data)
}

fn read_constraints(
    root: &Root,
    data: &mut SkeletonData,
    scale: f32,
    format: FormatVersion,
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

    for def in &root.transform {
        let mut bones = Vec::with_capacity(def.bones.len());
        for name in &def.bones {
            bones.push(bone(&def.name, name)?);
        }
        let mix_x = def.mix_x.unwrap_or(1.0);
        let mix_scale_x = def.mix_scale_x.unwrap_or(1.0);
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
            mix_rotate: def.mix_rotate.unwrap_or(1.0),
            mix_x,
            mix_y: def.mix_y.unwrap_or(mix_x),
            mix_scale_x,
            mix_scale_y: def.mix_scale_y.unwrap_or(mix_scale_x),
            mix_shear_y: def.mix_shear_y.unwrap_or(1.0),
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
        let mix_x = def.mix_x.unwrap_or(1.0);
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
            mix_rotate: def.mix_rotate.unwrap_or(1.0),
            mix_x,
            mix_y: def.mix_y.unwrap_or(mix_x),
        });
    }

    if format.has_physics() {
        for def in &root.physics {
            data.physics_constraints.push(PhysicsConstraintData {
                name: def.name.clone(),
                order: def.order,
                skin_required: def.skin_required,
                bone: bone(&def.name, &def.bone)?,
                x: def.x,
                y: def.y,
                rotate: def.rotate,
                scale_x: def.scale_x,
                shear_x: def.shear_x,
                limit: def.limit.unwrap_or(5000.0) * scale,
                step: 1.0 / def.fps.unwrap_or(60.0),
                inertia: def.inertia.unwrap_or(1.0),
                strength: def.strength.unwrap_or(100.0),
                damping: def.damping.unwrap_or(1.0),
                mass_inverse: 1.0 / def.mass.unwrap_or(1.0),
                wind: def.wind.unwrap_or(0.0),
                gravity: def.gravity.unwrap_or(0.0),
                mix: def.mix.unwrap_or(1.0),
                inertia_global: def.inertia_global,
                strength_global: def.strength_global,
                damping_global: def.damping_global,
                mass_global: def.mass_global,
                wind_global: def.wind_global,
                gravity_global: def.gravity_global,
                mix_global: def.mix_global,
            });
        }
    }
    Ok(())
}

fn timeline1(
    keys: &[super::FloatKey],
    default_value: f32,
    value_scale: f32,
    duration: &mut f32,
    context: &str,
) -> Result<Vec<FloatFrame>, Error> {
    let mut frames = Vec::with_capacity(keys.len());
    for key in keys {
        *duration = duration.max(key.time);
        frames.push(FloatFrame {
            time: key.time,
            value: key.value.unwrap_or(default_value) * value_scale,
            curve: parse_curve_4x_1(&key.curve, value_scale, context)?,
        });
    }
    Ok(frames)
}

fn timeline2(
    keys: &[super::Vec2Key],
    default_value: f32,
    value_scale: f32,
    duration: &mut f32,
    context: &str,
) -> Result<Vec<Vec2Frame>, Error> {
    let mut frames = Vec::with_capacity(keys.len());
    for key in keys {
        *duration = duration.max(key.time);
        frames.push(Vec2Frame {
            time: key.time,
            x: key.x.unwrap_or(default_value) * value_scale,
            y: key.y.unwrap_or(default_value) * value_scale,
            curve: parse_curve_4x(&key.curve, [value_scale; 2], context)?,
        });
    }
    Ok(frames)
}

#[allow(clippy::too_many_arguments)]
fn read_animation(
    name: &str,
    def: &AnimationDef,
    data: &SkeletonData,
    scale: f32,
    format: FormatVersion,
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
        read_bone_timelines(
            name,
            bone_name,
            bone,
            anim,
            scale,
            format,
            &mut bone_timelines,
            &mut duration,
        )?;
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
                curve: parse_curve_4x(&key.curve, [1.0, scale], &context)?,
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
            let mix_x = key.mix_x.unwrap_or(1.0);
            let mix_scale_x = key.mix_scale_x.unwrap_or(1.0);
            frames.push(TransformFrame {
                time: key.time,
                mix_rotate: key.mix_rotate.unwrap_or(1.0),
                mix_x,
                mix_y: key.mix_y.unwrap_or(mix_x),
                mix_scale_x,
                mix_scale_y: key.mix_scale_y.unwrap_or(mix_scale_x),
                mix_shear_y: key.mix_shear_y.unwrap_or(1.0),
                curve: parse_curve_4x(&key.curve, [1.0; 6], &context)?,
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
                        let raw = key
                            .value
                            .or(if timeline_name == "position" {
                                key.position
                            } else {
                                key.spacing
                            })
                            .unwrap_or(0.0);
                        frames.push(FloatFrame {
                            time: key.time,
                            value: raw * value_scale,
                            curve: parse_curve_4x_1(&key.curve, value_scale, &context)?,
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
                        let mix_x = key.mix_x.unwrap_or(1.0);
                        frames.push(PathMixFrame {
                            time: key.time,
                            mix_rotate: key.mix_rotate.unwrap_or(1.0),
                            mix_x,
                            mix_y: key.mix_y.unwrap_or(mix_x),
                            curve: parse_curve_4x(&key.curve, [1.0; 3], &context)?,
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

    let mut physics_constraint_timelines = Vec::new();
    if format.has_physics() {
        for (constraint_name, timelines) in &def.physics.0 {
            // An empty constraint name keys every physics constraint.
            let constraint_index = if constraint_name.is_empty() {
                -1
            } else {
                data.physics_constraints
                    .iter()
                    .position(|c| &c.name == constraint_name)
                    .ok_or_else(|| Error::JsonUnknownConstraintTimeline {
                        animation: name.to_string(),
                        kind: "physics".to_string(),
                        constraint: constraint_name.clone(),
                    })? as i32
            };
            for (timeline_name, keys) in &timelines.0 {
                if timeline_name == "reset" {
                    let mut frames = Vec::with_capacity(keys.len());
                    for key in keys {
                        duration = duration.max(key.time);
                        frames.push(key.time);
                    }
                    physics_constraint_timelines.push(PhysicsConstraintTimeline::Reset(
                        PhysicsConstraintResetTimeline {
                            constraint_index,
                            frames,
                        },
                    ));
                    continue;
                }
                let context =
                    format!("animation '{name}' physics '{constraint_name}' {timeline_name}");
                let mut frames = Vec::with_capacity(keys.len());
                for key in keys {
                    duration = duration.max(key.time);
                    frames.push(FloatFrame {
                        time: key.time,
                        value: key.value.unwrap_or(0.0),
                        curve: parse_curve_4x_1(&key.curve, 1.0, &context)?,
                    });
                }
                let timeline = PhysicsConstraintFloatTimeline {
                    constraint_index,
                    frames,
                };
                physics_constraint_timelines.push(match timeline_name.as_str() {
                    "inertia" => PhysicsConstraintTimeline::Inertia(timeline),
                    "strength" => PhysicsConstraintTimeline::Strength(timeline),
                    "damping" => PhysicsConstraintTimeline::Damping(timeline),
                    "mass" => PhysicsConstraintTimeline::Mass(timeline),
                    "wind" => PhysicsConstraintTimeline::Wind(timeline),
                    "gravity" => PhysicsConstraintTimeline::Gravity(timeline),
                    "mix" => PhysicsConstraintTimeline::Mix(timeline),
                    _ => continue,
                });
            }
        }
    }

    let mut deform_timelines = Vec::new();
    let mut sequence_timelines = Vec::new();
    for (skin_name, slots) in &def.attachments.0 {
        if data.skin(skin_name).is_none() {
            return Err(Error::JsonUnknownTimelineSkin {
                animation: name.to_string(),
                skin: skin_name.clone(),
            });
        }
        for (slot_name, attachments) in &slots.0 {
            let slot =
                *slot_index
                    .get(slot_name)
                    .ok_or_else(|| Error::JsonUnknownAnimationSlot {
                        animation: name.to_string(),
                        slot: slot_name.clone(),
                    })?;
            for (attachment_name, anim) in &attachments.0 {
                let no_sequences: &[super::SequenceKey] = &[];
                let (deform_keys, sequence_keys) = match anim {
                    AttachmentAnimDef::Timelines { deform, sequence } => {
                        (deform.as_slice(), sequence.as_slice())
                    }
                    AttachmentAnimDef::Direct(keys) => (keys.as_slice(), no_sequences),
                };
                if !deform_keys.is_empty() {
                    deform_timelines.push(read_deform_timeline(
                        name,
                        data,
                        skin_name,
                        slot,
                        attachment_name,
                        deform_keys,
                        scale,
                        &mut duration,
                    )?);
                }
                if format.has_physics() && !sequence_keys.is_empty() {
                    let mut frames = Vec::with_capacity(sequence_keys.len());
                    for key in sequence_keys {
                        duration = duration.max(key.time);
                        frames.push(SequenceFrame {
                            time: key.time,
                            mode: parse_sequence_mode(key.mode.as_deref()),
                            index: key.index,
                            delay: key.delay,
                        });
                    }
                    sequence_timelines.push(SequenceTimeline {
                        skin: skin_name.clone(),
                        slot_index: slot,
                        attachment: attachment_name.clone(),
                        frames,
                    });
                }
            }
        }
    }

    let draw_order_timeline = read_draw_order_timeline(
        name,
        &def.draw_order,
        slot_index,
        data.slots.len(),
        &mut duration,
    )?;
    let event_timeline = read_event_timeline(name, &def.events, data, &mut duration)?;

    Ok(Animation {
        name: name.to_string(),
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

    if !anim.rgba.is_empty() {
        let context = format!("animation '{animation}' slot '{slot_name}' rgba");
        let mut frames = Vec::with_capacity(anim.rgba.len());
        for key in &anim.rgba {
            *duration = duration.max(key.time);
            let color = parse_color_rgba(key.color.as_deref().unwrap_or("ffffffff"), &context)?;
            frames.push(ColorFrame {
                time: key.time,
                color,
                curve: parse_curve_4x(&key.curve, [1.0; 4], &context)?,
            });
        }
        out.push(SlotTimeline::Rgba(RgbaTimeline { slot_index, frames }));
    }

    if !anim.rgb.is_empty() {
        let context = format!("animation '{animation}' slot '{slot_name}' rgb");
        let mut frames = Vec::with_capacity(anim.rgb.len());
        for key in &anim.rgb {
            *duration = duration.max(key.time);
            let color = parse_color_rgb(key.color.as_deref().unwrap_or("ffffff"), &context)?;
            frames.push(RgbFrame {
                time: key.time,
                color,
                curve: parse_curve_4x(&key.curve, [1.0; 3], &context)?,
            });
        }
        out.push(SlotTimeline::Rgb(RgbTimeline { slot_index, frames }));
    }

    if !anim.alpha.is_empty() {
        let context = format!("animation '{animation}' slot '{slot_name}' alpha");
        let mut frames = Vec::with_capacity(anim.alpha.len());
        for key in &anim.alpha {
            *duration = duration.max(key.time);
            frames.push(AlphaFrame {
                time: key.time,
                alpha: key.value.unwrap_or(1.0),
                curve: parse_curve_4x_1(&key.curve, 1.0, &context)?,
            });
        }
        out.push(SlotTimeline::Alpha(AlphaTimeline { slot_index, frames }));
    }

    if !anim.rgba2.is_empty() {
        let context = format!("animation '{animation}' slot '{slot_name}' rgba2");
        let mut frames = Vec::with_capacity(anim.rgba2.len());
        for key in &anim.rgba2 {
            *duration = duration.max(key.time);
            frames.push(Rgba2Frame {
                time: key.time,
                light: parse_color_rgba(key.light.as_deref().unwrap_or("ffffffff"), &context)?,
                dark: parse_color_rgb(key.dark.as_deref().unwrap_or("ffffff"), &context)?,
                curve: parse_curve_4x(&key.curve, [1.0; 7], &context)?,
            });
        }
        out.push(SlotTimeline::Rgba2(Rgba2Timeline { slot_index, frames }));
    }

    if !anim.rgb2.is_empty() {
        let context = format!("animation '{animation}' slot '{slot_name}' rgb2");
        let mut frames = Vec::with_capacity(anim.rgb2.len());
        for key in &anim.rgb2 {
            *duration = duration.max(key.time);
            frames.push(Rgb2Frame {
                time: key.time,
                light: parse_color_rgb(key.light.as_deref().unwrap_or("ffffff"), &context)?,
                dark: parse_color_rgb(key.dark.as_deref().unwrap_or("ffffff"), &context)?,
                curve: parse_curve_4x(&key.curve, [1.0; 6], &context)?,
            });
        }
        out.push(SlotTimeline::Rgb2(Rgb2Timeline { slot_index, frames }));
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
    format: FormatVersion,
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
                angle: key.value.or(key.angle).unwrap_or(0.0),
                curve: parse_curve_4x_1(&key.curve, 1.0, &context)?,
            });
        }
        out.push(BoneTimeline::Rotate(RotateTimeline { bone_index, frames }));
    }
    if !anim.translate.is_empty() {
        out.push(BoneTimeline::Translate(TranslateTimeline {
            bone_index,
            frames: timeline2(&anim.translate, 0.0, scale, duration, &context("translate"))?,
        }));
    }
    if !anim.translate_x.is_empty() {
        out.push(BoneTimeline::TranslateX(TranslateXTimeline {
            bone_index,
            frames: timeline1(
                &anim.translate_x,
                0.0,
                scale,
                duration,
                &context("translatex"),
            )?,
        }));
    }
    if !anim.translate_y.is_empty() {
        out.push(BoneTimeline::TranslateY(TranslateYTimeline {
            bone_index,
            frames: timeline1(
                &anim.translate_y,
                0.0,
                scale,
                duration,
                &context("translatey"),
            )?,
        }));
    }
    if !anim.scale.is_empty() {
        out.push(BoneTimeline::Scale(ScaleTimeline {
            bone_index,
            frames: timeline2(&anim.scale, 1.0, 1.0, duration, &context("scale"))?,
        }));
    }
    if !anim.scale_x.is_empty() {
        out.push(BoneTimeline::ScaleX(ScaleXTimeline {
            bone_index,
            frames: timeline1(&anim.scale_x, 1.0, 1.0, duration, &context("scalex"))?,
        }));
    }
    if !anim.scale_y.is_empty() {
        out.push(BoneTimeline::ScaleY(ScaleYTimeline {
            bone_index,
            frames: timeline1(&anim.scale_y, 1.0, 1.0, duration, &context("scaley"))?,
        }));
    }
    if !anim.shear.is_empty() {
        out.push(BoneTimeline::Shear(ShearTimeline {
            bone_index,
            frames: timeline2(&anim.shear, 0.0, 1.0, duration, &context("shear"))?,
        }));
    }
    if !anim.shear_x.is_empty() {
        out.push(BoneTimeline::ShearX(ShearXTimeline {
            bone_index,
            frames: timeline1(&anim.shear_x, 0.0, 1.0, duration, &context("shearx"))?,
        }));
    }
    if !anim.shear_y.is_empty() {
        out.push(BoneTimeline::ShearY(ShearYTimeline {
            bone_index,
            frames: timeline1(&anim.shear_y, 0.0, 1.0, duration, &context("sheary"))?,
        }));
    }
    if format == FormatVersion::V42 && !anim.inherit.is_empty() {
        let mut frames = Vec::with_capacity(anim.inherit.len());
        for key in &anim.inherit {
            *duration = duration.max(key.time);
            frames.push(InheritFrame {
                time: key.time,
                inherit: parse_inherit(key.inherit.as_deref()),
            });
        }
        out.push(BoneTimeline::Inherit(InheritTimeline { bone_index, frames }));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn read_deform_timeline(
    animation: &str,
    data: &SkeletonData,
    skin_name: &str,
    slot_index: usize,
    attachment_name: &str,
    keys: &[super::DeformKey],
    scale: f32,
    duration: &mut f32,
) -> Result<DeformTimeline, Error> {
    let vertices = super::deform_target(data, animation, skin_name, slot_index, attachment_name)?;
    let (deform_length, setup) = vertices.deform_setup();
    let context = format!("animation '{animation}' deform '{attachment_name}'");
    let invalid = |message: String| Error::JsonInvalidAttachmentData {
        skin: skin_name.to_string(),
        slot: slot_index.to_string(),
        attachment: attachment_name.to_string(),
        message,
    };

    let mut frames = Vec::with_capacity(keys.len());
    for key in keys {
        *duration = duration.max(key.time);
        frames.push(DeformFrame {
            time: key.time,
            vertices: super::deform_frame_values(
                key,
                deform_length,
                setup.as_deref(),
                scale,
                &invalid,
            )?,
            curve: parse_curve_4x_1(&key.curve, 1.0, &context)?,
        });
    }
    Ok(DeformTimeline {
        skin: skin_name.to_string(),
        slot_index,
        attachment: attachment_name.to_string(),
        frames,
    })
}

pub(super) fn read_draw_order_timeline(
    animation: &str,
    keys: &[super::DrawOrderKey],
    slot_index: &HashMap<String, usize>,
    slot_count: usize,
    duration: &mut f32,
) -> Result<Option<DrawOrderTimeline>, Error> {
    if keys.is_empty() {
        return Ok(None);
    }
    let mut frames = Vec::with_capacity(keys.len());
    for key in keys {
        *duration = duration.max(key.time);
        let draw_order = if key.offsets.is_empty() {
            None
        } else {
            Some(super::build_draw_order(
                &key.offsets,
                slot_index,
                slot_count,
                animation,
            )?)
        };
        frames.push(DrawOrderFrame {
            time: key.time,
            draw_order,
        });
    }
    Ok(Some(DrawOrderTimeline { frames }))
}

pub(super) fn read_event_timeline(
    animation: &str,
    keys: &[super::EventKey],
    data: &SkeletonData,
    duration: &mut f32,
) -> Result<Option<EventTimeline>, Error> {
    if keys.is_empty() {
        return Ok(None);
    }
    let mut events = Vec::with_capacity(keys.len());
    for key in keys {
        *duration = duration.max(key.time);
        let data_index = data
            .events
            .iter()
            .position(|e| e.name == key.name)
            .ok_or_else(|| Error::JsonUnknownEvent {
                animation: animation.to_string(),
                event: key.name.clone(),
            })?;
        let event_data = &data.events[data_index];
        let (volume, balance) = if event_data.audio_path.is_empty() {
            (1.0, 0.0)
        } else {
            (
                key.volume.unwrap_or(1.0),
                key.balance.unwrap_or(0.0),
            )
        };
        events.push(Event {
            time: key.time,
            data: data_index,
            int_value: key.int_value.unwrap_or(event_data.int_value),
            float_value: key.float_value.unwrap_or(event_data.float_value),
            string_value: key
                .string_value
                .clone()
                .unwrap_or_else(|| event_data.string_value.clone()),
            volume,
            balance,
        });
    }
    Ok(Some(EventTimeline { events }))
}
