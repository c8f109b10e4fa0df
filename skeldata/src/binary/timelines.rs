//! Timeline decoding shared by the 4.x binary readers.
//!
//! 4.x curve timelines carry the first frame's values up front; each
//! following frame supplies the next values and a curve byte for the span in
//! between (`0` linear, `1` stepped, `2` Bezier with four control floats per
//! value channel).

use super::{BinaryInput, CURVE_BEZIER, CURVE_STEPPED};
use crate::{
    AlphaFrame, AlphaTimeline, ColorFrame, Curve, DeformFrame, DeformTimeline, Error, FloatFrame,
    IkFrame, PathMixFrame, Rgb2Frame, Rgb2Timeline, RgbFrame, RgbTimeline, Rgba2Frame,
    Rgba2Timeline, RgbaTimeline, RotateFrame, TransformFrame, Vec2Frame,
};

pub(super) fn read_bezier(input: &mut BinaryInput<'_>, scale: f32) -> Result<Curve, Error> {
    let cx1 = input.read_f32_be()?;
    let cy1 = input.read_f32_be()? * scale;
    let cx2 = input.read_f32_be()?;
    let cy2 = input.read_f32_be()? * scale;
    Ok(Curve::Bezier { cx1, cy1, cx2, cy2 })
}

fn read_curve_n<const N: usize>(
    input: &mut BinaryInput<'_>,
    scales: [f32; N],
) -> Result<[Curve; N], Error> {
    match input.read_i8()? {
        0 => Ok([Curve::Linear; N]),
        CURVE_STEPPED => Ok([Curve::Stepped; N]),
        CURVE_BEZIER => {
            let mut curves = [Curve::Linear; N];
            for (curve, scale) in curves.iter_mut().zip(scales) {
                *curve = read_bezier(input, scale)?;
            }
            Ok(curves)
        }
        other => Err(Error::BinaryParse {
            message: format!("invalid curve type {other}"),
        }),
    }
}

fn read_curve_1(input: &mut BinaryInput<'_>, scale: f32) -> Result<Curve, Error> {
    Ok(read_curve_n(input, [scale])?[0])
}

pub(super) fn read_timeline1(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    value_scale: f32,
    duration: &mut f32,
) -> Result<Vec<FloatFrame>, Error> {
    let mut frames = Vec::with_capacity(frame_count);
    if frame_count == 0 {
        return Ok(frames);
    }
    let frame_last = frame_count - 1;
    let mut time = input.read_f32_be()?;
    let mut value = input.read_f32_be()? * value_scale;
    for frame in 0..frame_count {
        *duration = duration.max(time);
        if frame == frame_last {
            frames.push(FloatFrame {
                time,
                value,
                curve: Curve::Linear,
            });
            break;
        }
        let time2 = input.read_f32_be()?;
        let value2 = input.read_f32_be()? * value_scale;
        let curve = read_curve_1(input, value_scale)?;
        frames.push(FloatFrame { time, value, curve });
        time = time2;
        value = value2;
    }
    Ok(frames)
}

pub(super) fn read_timeline2(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    value_scale: f32,
    duration: &mut f32,
) -> Result<Vec<Vec2Frame>, Error> {
    let mut frames = Vec::with_capacity(frame_count);
    if frame_count == 0 {
        return Ok(frames);
    }
    let frame_last = frame_count - 1;
    let mut time = input.read_f32_be()?;
    let mut x = input.read_f32_be()? * value_scale;
    let mut y = input.read_f32_be()? * value_scale;
    for frame in 0..frame_count {
        *duration = duration.max(time);
        if frame == frame_last {
            frames.push(Vec2Frame {
                time,
                x,
                y,
                curve: [Curve::Linear; 2],
            });
            break;
        }
        let time2 = input.read_f32_be()?;
        let x2 = input.read_f32_be()? * value_scale;
        let y2 = input.read_f32_be()? * value_scale;
        let curve = read_curve_n(input, [value_scale; 2])?;
        frames.push(Vec2Frame { time, x, y, curve });
        time = time2;
        x = x2;
        y = y2;
    }
    Ok(frames)
}

pub(super) fn read_rotate_timeline(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    duration: &mut f32,
) -> Result<Vec<RotateFrame>, Error> {
    let frames = read_timeline1(input, frame_count, 1.0, duration)?;
    Ok(frames
        .into_iter()
        .map(|f| RotateFrame {
            time: f.time,
            angle: f.value,
            curve: f.curve,
        })
        .collect())
}

pub(super) fn read_rgba_timeline(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    slot_index: usize,
    duration: &mut f32,
) -> Result<RgbaTimeline, Error> {
    let frame_last = frame_count.saturating_sub(1);
    let mut frames = Vec::with_capacity(frame_count);
    let mut time = input.read_f32_be()?;
    let mut color = input.read_color_rgba()?;
    for frame in 0..frame_count {
        *duration = duration.max(time);
        if frame == frame_last {
            frames.push(ColorFrame {
                time,
                color,
                curve: [Curve::Linear; 4],
            });
            break;
        }
        let time2 = input.read_f32_be()?;
        let color2 = input.read_color_rgba()?;
        let curve = read_curve_n(input, [1.0; 4])?;
        frames.push(ColorFrame { time, color, curve });
        time = time2;
        color = color2;
    }
    Ok(RgbaTimeline { slot_index, frames })
}

fn read_color_rgb(input: &mut BinaryInput<'_>) -> Result<[f32; 3], Error> {
    Ok([
        input.read_u8()? as f32 / 255.0,
        input.read_u8()? as f32 / 255.0,
        input.read_u8()? as f32 / 255.0,
    ])
}

pub(super) fn read_rgb_timeline(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    slot_index: usize,
    duration: &mut f32,
) -> Result<RgbTimeline, Error> {
    let frame_last = frame_count.saturating_sub(1);
    let mut frames = Vec::with_capacity(frame_count);
    let mut time = input.read_f32_be()?;
    let mut color = read_color_rgb(input)?;
    for frame in 0..frame_count {
        *duration = duration.max(time);
        if frame == frame_last {
            frames.push(RgbFrame {
                time,
                color,
                curve: [Curve::Linear; 3],
            });
            break;
        }
        let time2 = input.read_f32_be()?;
        let color2 = read_color_rgb(input)?;
        let curve = read_curve_n(input, [1.0; 3])?;
        frames.push(RgbFrame { time, color, curve });
        time = time2;
        color = color2;
    }
    Ok(RgbTimeline { slot_index, frames })
}

pub(super) fn read_alpha_timeline(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    slot_index: usize,
    duration: &mut f32,
) -> Result<AlphaTimeline, Error> {
    let frame_last = frame_count.saturating_sub(1);
    let mut frames = Vec::with_capacity(frame_count);
    let mut time = input.read_f32_be()?;
    let mut alpha = input.read_u8()? as f32 / 255.0;
    for frame in 0..frame_count {
        *duration = duration.max(time);
        if frame == frame_last {
            frames.push(AlphaFrame {
                time,
                alpha,
                curve: Curve::Linear,
            });
            break;
        }
        let time2 = input.read_f32_be()?;
        let alpha2 = input.read_u8()? as f32 / 255.0;
        let curve = read_curve_1(input, 1.0)?;
        frames.push(AlphaFrame { time, alpha, curve });
        time = time2;
        alpha = alpha2;
    }
    Ok(AlphaTimeline { slot_index, frames })
}

pub(super) fn read_rgba2_timeline(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    slot_index: usize,
    duration: &mut f32,
) -> Result<Rgba2Timeline, Error> {
    let frame_last = frame_count.saturating_sub(1);
    let mut frames = Vec::with_capacity(frame_count);
    let mut time = input.read_f32_be()?;
    let mut light = input.read_color_rgba()?;
    let mut dark = read_color_rgb(input)?;
    for frame in 0..frame_count {
        *duration = duration.max(time);
        if frame == frame_last {
            frames.push(Rgba2Frame {
                time,
                light,
                dark,
                curve: [Curve::Linear; 7],
            });
            break;
        }
        let time2 = input.read_f32_be()?;
        let light2 = input.read_color_rgba()?;
        let dark2 = read_color_rgb(input)?;
        let curve = read_curve_n(input, [1.0; 7])?;
        frames.push(Rgba2Frame {
            time,
            light,
            dark,
            curve,
        });
        time = time2;
        light = light2;
        dark = dark2;
    }
    Ok(Rgba2Timeline { slot_index, frames })
}

pub(super) fn read_rgb2_timeline(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    slot_index: usize,
    duration: &mut f32,
) -> Result<Rgb2Timeline, Error> {
    let frame_last = frame_count.saturating_sub(1);
    let mut frames = Vec::with_capacity(frame_count);
    let mut time = input.read_f32_be()?;
    let mut light = read_color_rgb(input)?;
    let mut dark = read_color_rgb(input)?;
    for frame in 0..frame_count {
        *duration = duration.max(time);
        if frame == frame_last {
            frames.push(Rgb2Frame {
                time,
                light,
                dark,
                curve: [Curve::Linear; 6],
            });
            break;
        }
        let time2 = input.read_f32_be()?;
        let light2 = read_color_rgb(input)?;
        let dark2 = read_color_rgb(input)?;
        let curve = read_curve_n(input, [1.0; 6])?;
        frames.push(Rgb2Frame {
            time,
            light,
            dark,
            curve,
        });
        time = time2;
        light = light2;
        dark = dark2;
    }
    Ok(Rgb2Timeline { slot_index, frames })
}

pub(super) fn read_ik_timeline_frames(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    scale: f32,
    duration: &mut f32,
) -> Result<Vec<IkFrame>, Error> {
    let frame_last = frame_count.saturating_sub(1);
    let mut frames = Vec::with_capacity(frame_count);
    let mut time = input.read_f32_be()?;
    let mut mix = input.read_f32_be()?;
    let mut softness = input.read_f32_be()? * scale;
    for frame in 0..frame_count {
        *duration = duration.max(time);
        let bend_direction = input.read_i8()? as i32;
        let compress = input.read_bool()?;
        let stretch = input.read_bool()?;
        if frame == frame_last {
            frames.push(IkFrame {
                time,
                mix,
                softness,
                bend_direction,
                compress,
                stretch,
                curve: [Curve::Linear; 2],
            });
            break;
        }
        let time2 = input.read_f32_be()?;
        let mix2 = input.read_f32_be()?;
        let softness2 = input.read_f32_be()? * scale;
        let curve = read_curve_n(input, [1.0, scale])?;
        frames.push(IkFrame {
            time,
            mix,
            softness,
            bend_direction,
            compress,
            stretch,
            curve,
        });
        time = time2;
        mix = mix2;
        softness = softness2;
    }
    Ok(frames)
}

pub(super) fn read_transform_timeline_frames(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    duration: &mut f32,
) -> Result<Vec<TransformFrame>, Error> {
    let frame_last = frame_count.saturating_sub(1);
    let mut frames = Vec::with_capacity(frame_count);
    let mut time = input.read_f32_be()?;
    let mut mix = [
        input.read_f32_be()?,
        input.read_f32_be()?,
        input.read_f32_be()?,
        input.read_f32_be()?,
        input.read_f32_be()?,
        input.read_f32_be()?,
    ];
    for frame in 0..frame_count {
        *duration = duration.max(time);
        if frame == frame_last {
            frames.push(transform_frame(time, mix, [Curve::Linear; 6]));
            break;
        }
        let time2 = input.read_f32_be()?;
        let mix2 = [
            input.read_f32_be()?,
            input.read_f32_be()?,
            input.read_f32_be()?,
            input.read_f32_be()?,
            input.read_f32_be()?,
            input.read_f32_be()?,
        ];
        let curve = read_curve_n(input, [1.0; 6])?;
        frames.push(transform_frame(time, mix, curve));
        time = time2;
        mix = mix2;
    }
    Ok(frames)
}

fn transform_frame(time: f32, mix: [f32; 6], curve: [Curve; 6]) -> TransformFrame {
    TransformFrame {
        time,
        mix_rotate: mix[0],
        mix_x: mix[1],
        mix_y: mix[2],
        mix_scale_x: mix[3],
        mix_scale_y: mix[4],
        mix_shear_y: mix[5],
        curve,
    }
}

pub(super) fn read_path_mix_timeline_frames(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    duration: &mut f32,
) -> Result<Vec<PathMixFrame>, Error> {
    let frame_last = frame_count.saturating_sub(1);
    let mut frames = Vec::with_capacity(frame_count);
    let mut time = input.read_f32_be()?;
    let mut mix_rotate = input.read_f32_be()?;
    let mut mix_x = input.read_f32_be()?;
    let mut mix_y = input.read_f32_be()?;
    for frame in 0..frame_count {
        *duration = duration.max(time);
        if frame == frame_last {
            frames.push(PathMixFrame {
                time,
                mix_rotate,
                mix_x,
                mix_y,
                curve: [Curve::Linear; 3],
            });
            break;
        }
        let time2 = input.read_f32_be()?;
        let mix_rotate2 = input.read_f32_be()?;
        let mix_x2 = input.read_f32_be()?;
        let mix_y2 = input.read_f32_be()?;
        let curve = read_curve_n(input, [1.0; 3])?;
        frames.push(PathMixFrame {
            time,
            mix_rotate,
            mix_x,
            mix_y,
            curve,
        });
        time = time2;
        mix_rotate = mix_rotate2;
        mix_x = mix_x2;
        mix_y = mix_y2;
    }
    Ok(frames)
}

/// 4.x deform timeline body: the frame's time leads, the sparse vertex slice
/// follows, and the curve byte trails every non-final frame.
#[allow(clippy::too_many_arguments)]
pub(super) fn read_deform_timeline(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    skin: String,
    slot_index: usize,
    attachment: String,
    deform_length: usize,
    setup: Option<&[f32]>,
    scale: f32,
    duration: &mut f32,
) -> Result<DeformTimeline, Error> {
    let frame_last = frame_count.saturating_sub(1);
    let mut frames = Vec::with_capacity(frame_count);
    let mut time = input.read_f32_be()?;
    for frame in 0..frame_count {
        *duration = duration.max(time);
        let vertices = super::read_deform_vertices(input, deform_length, setup, scale)?;
        if frame == frame_last {
            frames.push(DeformFrame {
                time,
                vertices,
                curve: Curve::Linear,
            });
            break;
        }
        let time2 = input.read_f32_be()?;
        let curve = read_curve_1(input, 1.0)?;
        frames.push(DeformFrame {
            time,
            vertices,
            curve,
        });
        time = time2;
    }
    Ok(DeformTimeline {
        skin,
        slot_index,
        attachment,
        frames,
    })
}
