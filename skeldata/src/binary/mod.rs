//! Binary (`.skel`) loaders.
//!
//! The loaders are IO-free: they operate on an in-memory byte slice. The
//! header names the export version and a per-version reader module decodes
//! the rest of the stream (`v38`, `v40`, `v42`).

mod timelines;
mod v38;
mod v40;
mod v42;

use crate::{
    AttachmentData, BlendMode, DrawOrderFrame, DrawOrderTimeline, Error, Event, EventData,
    EventTimeline, FormatVersion, Inherit, PositionMode, RotateMode, SequenceMode, SkeletonData,
    SpacingMode, VertexWeight, Vertices,
};
use byteorder::{BigEndian, ByteOrder};

pub(crate) const CURVE_STEPPED: i8 = 1;
pub(crate) const CURVE_BEZIER: i8 = 2;

#[derive(Clone, Debug)]
pub(crate) struct BinaryInput<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> BinaryInput<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.cursor)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, Error> {
        if self.cursor >= self.bytes.len() {
            return Err(Error::BinaryParse {
                message: "unexpected EOF".to_string(),
            });
        }
        let b = self.bytes[self.cursor];
        self.cursor += 1;
        Ok(b)
    }

    pub(crate) fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    pub(crate) fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_u8()? != 0)
    }

    pub(crate) fn read_i32_be(&mut self) -> Result<i32, Error> {
        if self.remaining() < 4 {
            return Err(Error::BinaryParse {
                message: "unexpected EOF".to_string(),
            });
        }
        let v = BigEndian::read_i32(&self.bytes[self.cursor..self.cursor + 4]);
        self.cursor += 4;
        Ok(v)
    }

    pub(crate) fn read_f32_be(&mut self) -> Result<f32, Error> {
        if self.remaining() < 4 {
            return Err(Error::BinaryParse {
                message: "unexpected EOF".to_string(),
            });
        }
        let v = BigEndian::read_f32(&self.bytes[self.cursor..self.cursor + 4]);
        self.cursor += 4;
        Ok(v)
    }

    /// Little-endian 7-bit groups, at most five bytes. A continuation bit on
    /// the fifth byte would name a sixth group and is malformed.
    pub(crate) fn read_varint(&mut self, optimize_positive: bool) -> Result<i32, Error> {
        let mut b = self.read_u8()?;
        let mut value: u32 = (b & 0x7F) as u32;
        if (b & 0x80) != 0 {
            b = self.read_u8()?;
            value |= ((b & 0x7F) as u32) << 7;
            if (b & 0x80) != 0 {
                b = self.read_u8()?;
                value |= ((b & 0x7F) as u32) << 14;
                if (b & 0x80) != 0 {
                    b = self.read_u8()?;
                    value |= ((b & 0x7F) as u32) << 21;
                    if (b & 0x80) != 0 {
                        b = self.read_u8()?;
                        if (b & 0x80) != 0 {
                            return Err(Error::BinaryParse {
                                message: format!(
                                    "varint exceeds 5 bytes at offset {}",
                                    self.cursor
                                ),
                            });
                        }
                        value |= ((b & 0x7F) as u32) << 28;
                    }
                }
            }
        }

        if optimize_positive {
            Ok(value as i32)
        } else {
            Ok((value >> 1) as i32 ^ -((value & 1) as i32))
        }
    }

    /// Varint length (0 means null), then `length - 1` UTF-8 bytes.
    pub(crate) fn read_string(&mut self) -> Result<Option<String>, Error> {
        let length_offset = self.cursor;
        let length = self.read_varint(true)?;
        if length == 0 {
            return Ok(None);
        }
        if length < 0 {
            return Err(Error::BinaryParse {
                message: format!("negative string length at offset {length_offset}"),
            });
        }
        let byte_len = length as usize - 1;
        if self.remaining() < byte_len {
            return Err(Error::BinaryParse {
                message: format!(
                    "unexpected EOF while reading string (len={byte_len}) at offset {}",
                    self.cursor
                ),
            });
        }
        let bytes = &self.bytes[self.cursor..self.cursor + byte_len];
        self.cursor += byte_len;
        let s = std::str::from_utf8(bytes).map_err(|e| Error::BinaryParse {
            message: format!("invalid utf-8 in string at offset {length_offset}: {e}"),
        })?;
        Ok(Some(s.to_string()))
    }

    /// Varint index into the document's string table; 0 means null.
    pub(crate) fn read_string_ref(&mut self, strings: &[String]) -> Result<Option<String>, Error> {
        let offset = self.cursor;
        let idx = self.read_varint(true)?;
        if idx == 0 {
            return Ok(None);
        }
        let i = (idx - 1) as usize;
        let s = strings.get(i).ok_or_else(|| Error::BinaryParse {
            message: format!(
                "invalid string reference {idx} (table len {}) at offset {offset}",
                strings.len()
            ),
        })?;
        Ok(Some(s.clone()))
    }

    pub(crate) fn read_color_rgba(&mut self) -> Result<[f32; 4], Error> {
        Ok([
            self.read_u8()? as f32 / 255.0,
            self.read_u8()? as f32 / 255.0,
            self.read_u8()? as f32 / 255.0,
            self.read_u8()? as f32 / 255.0,
        ])
    }

    pub(crate) fn read_float_array(&mut self, n: usize, scale: f32) -> Result<Vec<f32>, Error> {
        let mut out = Vec::with_capacity(n);
        if scale == 1.0 {
            for _ in 0..n {
                out.push(self.read_f32_be()?);
            }
        } else {
            for _ in 0..n {
                out.push(self.read_f32_be()? * scale);
            }
        }
        Ok(out)
    }

    /// Varint count, then big-endian u16 pairs.
    pub(crate) fn read_short_array(&mut self) -> Result<Vec<u16>, Error> {
        let n = self.read_varint(true)?;
        if n < 0 {
            return Err(Error::BinaryParse {
                message: format!("negative array length at offset {}", self.cursor),
            });
        }
        let mut out = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let hi = self.read_u8()? as u16;
            let lo = self.read_u8()? as u16;
            out.push((hi << 8) | lo);
        }
        Ok(out)
    }

    pub(crate) fn read_count(&mut self, what: &str) -> Result<usize, Error> {
        let offset = self.cursor;
        let n = self.read_varint(true)?;
        if n < 0 {
            return Err(Error::BinaryParse {
                message: format!("negative {what} count at offset {offset}"),
            });
        }
        Ok(n as usize)
    }

    /// Varint index validated against the owning sequence's length.
    pub(crate) fn read_index(&mut self, len: usize, what: &str) -> Result<usize, Error> {
        let offset = self.cursor;
        let i = self.read_varint(true)?;
        if i < 0 || i as usize >= len {
            return Err(Error::BinaryParse {
                message: format!("{what} index {i} out of range (len {len}) at offset {offset}"),
            });
        }
        Ok(i as usize)
    }
}

/// Forward reference from a linked mesh to its parent, resolved after all
/// skins are materialized.
#[derive(Clone, Debug)]
pub(crate) struct PendingLinkedMesh {
    /// Index of the skin owning the linked mesh.
    pub skin_index: usize,
    pub slot_index: usize,
    pub attachment_key: String,
    /// Parent skin name; `None` means the default skin.
    pub parent_skin: Option<String>,
    pub parent_key: String,
    pub inherit_timeline: bool,
}

pub(crate) fn map_inherit(v: i32) -> Inherit {
    match v {
        1 => Inherit::OnlyTranslation,
        2 => Inherit::NoRotationOrReflection,
        3 => Inherit::NoScale,
        4 => Inherit::NoScaleOrReflection,
        _ => Inherit::Normal,
    }
}

pub(crate) fn map_blend(v: i32) -> BlendMode {
    match v {
        1 => BlendMode::Additive,
        2 => BlendMode::Multiply,
        3 => BlendMode::Screen,
        _ => BlendMode::Normal,
    }
}

pub(crate) fn map_position_mode(v: i32) -> PositionMode {
    match v {
        0 => PositionMode::Fixed,
        _ => PositionMode::Percent,
    }
}

pub(crate) fn map_spacing_mode(v: i32) -> SpacingMode {
    match v {
        0 => SpacingMode::Length,
        1 => SpacingMode::Fixed,
        3 => SpacingMode::Proportional,
        _ => SpacingMode::Percent,
    }
}

pub(crate) fn map_rotate_mode(v: i32) -> RotateMode {
    match v {
        1 => RotateMode::Chain,
        2 => RotateMode::ChainScale,
        _ => RotateMode::Tangent,
    }
}

pub(crate) fn map_sequence_mode(v: i32) -> Result<SequenceMode, Error> {
    Ok(match v {
        0 => SequenceMode::Hold,
        1 => SequenceMode::Once,
        2 => SequenceMode::Loop,
        3 => SequenceMode::PingPong,
        4 => SequenceMode::OnceReverse,
        5 => SequenceMode::LoopReverse,
        6 => SequenceMode::PingPongReverse,
        other => {
            return Err(Error::BinaryParse {
                message: format!("invalid sequence mode {other}"),
            });
        }
    })
}

/// One boolean selects the vertex encoding: unweighted `x, y` floats or
/// per-vertex `(bone, x, y, weight)` influence groups.
pub(crate) fn read_vertices(
    input: &mut BinaryInput<'_>,
    vertex_count: usize,
    bone_count: usize,
    scale: f32,
) -> Result<Vertices, Error> {
    if !input.read_bool()? {
        let mut out = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let x = input.read_f32_be()? * scale;
            let y = input.read_f32_be()? * scale;
            out.push([x, y]);
        }
        return Ok(Vertices::Unweighted(out));
    }

    let mut weights_per_vertex = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let influences = input.read_count("vertex influence")?;
        let mut weights = Vec::with_capacity(influences);
        for _ in 0..influences {
            let bone = input.read_index(bone_count, "vertex bone")?;
            let x = input.read_f32_be()? * scale;
            let y = input.read_f32_be()? * scale;
            let weight = input.read_f32_be()?;
            weights.push(VertexWeight { bone, x, y, weight });
        }
        weights_per_vertex.push(weights);
    }
    Ok(Vertices::Weighted(weights_per_vertex))
}

/// Reads one deform frame's vertex values: a zero-length slice keys the
/// identity deformation; otherwise the dense `[start, start + end)` slice is
/// filled and, for unweighted attachments, the setup vertices are added to
/// every component.
pub(crate) fn read_deform_vertices(
    input: &mut BinaryInput<'_>,
    deform_length: usize,
    setup: Option<&[f32]>,
    scale: f32,
) -> Result<Vec<f32>, Error> {
    let end = input.read_count("deform slice")?;
    if end == 0 {
        return Ok(match setup {
            Some(setup) => setup.to_vec(),
            None => vec![0.0; deform_length],
        });
    }

    let mut deform = vec![0.0f32; deform_length];
    let start = input.read_count("deform offset")?;
    let stop = start + end;
    if stop > deform_length {
        return Err(Error::BinaryParse {
            message: format!("deform slice {start}..{stop} out of range (len {deform_length})"),
        });
    }
    if scale == 1.0 {
        for v in &mut deform[start..stop] {
            *v = input.read_f32_be()?;
        }
    } else {
        for v in &mut deform[start..stop] {
            *v = input.read_f32_be()? * scale;
        }
    }
    if let Some(setup) = setup {
        for (v, s) in deform.iter_mut().zip(setup) {
            *v += s;
        }
    }
    Ok(deform)
}

/// Rebuilds one draw-order frame's permutation from its packed offsets.
pub(crate) fn read_draw_order(
    input: &mut BinaryInput<'_>,
    slot_count: usize,
) -> Result<Vec<usize>, Error> {
    let offset_count = input.read_count("draw order offset")?;
    if offset_count > slot_count {
        return Err(Error::BinaryParse {
            message: format!("draw order offset count {offset_count} exceeds {slot_count} slots"),
        });
    }

    let mut draw_order = vec![usize::MAX; slot_count];
    let mut unchanged = vec![0usize; slot_count - offset_count];
    let mut original_index = 0usize;
    let mut unchanged_index = 0usize;

    for _ in 0..offset_count {
        let slot_index = input.read_index(slot_count, "draw order slot")?;
        // Collect unchanged items.
        while original_index != slot_index {
            if unchanged_index >= unchanged.len() {
                return Err(Error::BinaryParse {
                    message: "malformed draw order offsets".to_string(),
                });
            }
            unchanged[unchanged_index] = original_index;
            unchanged_index += 1;
            original_index += 1;
        }
        // Set changed items.
        let offset = input.read_varint(true)?;
        let target = original_index as i64 + offset as i64;
        if target < 0 || target >= slot_count as i64 {
            return Err(Error::BinaryParse {
                message: format!("draw order offset {offset} out of range for slot {slot_index}"),
            });
        }
        if draw_order[target as usize] != usize::MAX {
            return Err(Error::BinaryParse {
                message: format!("duplicate draw order target for slot {slot_index}"),
            });
        }
        draw_order[target as usize] = original_index;
        original_index += 1;
    }

    // Collect remaining unchanged items.
    while original_index < slot_count {
        if unchanged_index >= unchanged.len() {
            return Err(Error::BinaryParse {
                message: "malformed draw order offsets".to_string(),
            });
        }
        unchanged[unchanged_index] = original_index;
        unchanged_index += 1;
        original_index += 1;
    }

    // Fill in unchanged items, back to front.
    for slot in draw_order.iter_mut().rev() {
        if *slot == usize::MAX {
            unchanged_index -= 1;
            *slot = unchanged[unchanged_index];
        }
    }
    Ok(draw_order)
}

pub(crate) fn read_draw_order_timeline(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    slot_count: usize,
    duration: &mut f32,
) -> Result<DrawOrderTimeline, Error> {
    let mut frames = Vec::with_capacity(frame_count);
    for _ in 0..frame_count {
        let time = input.read_f32_be()?;
        *duration = duration.max(time);
        let draw_order = read_draw_order(input, slot_count)?;
        frames.push(DrawOrderFrame {
            time,
            draw_order: Some(draw_order),
        });
    }
    Ok(DrawOrderTimeline { frames })
}

/// Event definitions; 4.2 stores the event name inline while earlier formats
/// intern it in the string table.
pub(crate) fn read_event_data(
    input: &mut BinaryInput<'_>,
    strings: &[String],
    name_by_ref: bool,
) -> Result<Vec<EventData>, Error> {
    let count = input.read_count("event")?;
    let mut events = Vec::with_capacity(count);
    for _ in 0..count {
        let name = if name_by_ref {
            input.read_string_ref(strings)?
        } else {
            input.read_string()?
        }
        .unwrap_or_default();
        let int_value = input.read_varint(false)?;
        let float_value = input.read_f32_be()?;
        let string_value = input.read_string()?.unwrap_or_default();
        let audio_path = input.read_string()?.unwrap_or_default();
        let (volume, balance) = if audio_path.is_empty() {
            (1.0, 0.0)
        } else {
            (input.read_f32_be()?, input.read_f32_be()?)
        };
        events.push(EventData {
            name,
            int_value,
            float_value,
            string_value,
            audio_path,
            volume,
            balance,
        });
    }
    Ok(events)
}

pub(crate) fn read_event_timeline(
    input: &mut BinaryInput<'_>,
    frame_count: usize,
    events: &[EventData],
    duration: &mut f32,
) -> Result<EventTimeline, Error> {
    let mut frames = Vec::with_capacity(frame_count);
    for _ in 0..frame_count {
        let time = input.read_f32_be()?;
        *duration = duration.max(time);
        let data_index = input.read_index(events.len(), "event")?;
        let data = &events[data_index];
        let int_value = input.read_varint(false)?;
        let float_value = input.read_f32_be()?;
        let string_value = if input.read_bool()? {
            input.read_string()?.unwrap_or_default()
        } else {
            data.string_value.clone()
        };
        let (volume, balance) = if data.audio_path.is_empty() {
            (1.0, 0.0)
        } else {
            (input.read_f32_be()?, input.read_f32_be()?)
        };
        frames.push(Event {
            time,
            data: data_index,
            int_value,
            float_value,
            string_value,
            volume,
            balance,
        });
    }
    Ok(EventTimeline { events: frames })
}

/// Joins every queued linked mesh with its parent. Parents may themselves be
/// linked meshes loaded later, so resolution iterates until a fixpoint.
pub(crate) fn resolve_linked_meshes(
    data: &mut SkeletonData,
    pending: Vec<PendingLinkedMesh>,
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
                // The parent is itself an unresolved linked mesh.
                deferred.push(p);
                continue;
            }

            let vertices = parent_mesh.vertices.clone();
            let uvs = parent_mesh.uvs.clone();
            let triangles = parent_mesh.triangles.clone();
            let hull_length = parent_mesh.hull_length;

            let Some(AttachmentData::Mesh(mesh)) = data
                .skins
                .get_mut(p.skin_index)
                .and_then(|s| s.attachments.get_mut(p.slot_index))
                .and_then(|m| m.get_mut(&p.attachment_key))
            else {
                return Err(Error::BinaryParse {
                    message: format!("linked mesh {} vanished during resolution", p.attachment_key),
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
            return Err(Error::BinaryParse {
                message: format!(
                    "linked mesh resolution stalled: skin {}, slot {}, attachment {}",
                    p.skin_index, p.slot_index, p.attachment_key
                ),
            });
        }
        remaining = deferred;
    }
    Ok(())
}

/// Locates the deform target attachment of an attachment timeline and returns
/// its deform component count plus setup values.
pub(crate) fn deform_target(
    data: &SkeletonData,
    skin_index: usize,
    slot_index: usize,
    attachment_name: &str,
) -> Result<(usize, Option<Vec<f32>>), Error> {
    let attachment = data.skins[skin_index]
        .attachment(slot_index, attachment_name)
        .ok_or_else(|| Error::AttachmentNotFound {
            name: attachment_name.to_string(),
        })?;
    let vertices = match attachment {
        AttachmentData::Mesh(a) => &a.vertices,
        AttachmentData::BoundingBox(a) => &a.vertices,
        AttachmentData::Path(a) => &a.vertices,
        AttachmentData::Clipping(a) => &a.vertices,
        _ => {
            return Err(Error::BinaryParse {
                message: format!("attachment {attachment_name} cannot be deformed"),
            });
        }
    };
    Ok(vertices.deform_setup())
}

impl SkeletonData {
    /// Deserializes a binary skeleton document.
    pub fn from_binary(bytes: &[u8]) -> Result<SkeletonData, Error> {
        Self::from_binary_with_scale(bytes, 1.0)
    }

    /// Deserializes a binary skeleton document, multiplying every
    /// length-denominated field by `scale`.
    pub fn from_binary_with_scale(bytes: &[u8], scale: f32) -> Result<SkeletonData, Error> {
        let scale = if scale.is_finite() { scale } else { 1.0 };
        let mut input = BinaryInput::new(bytes);

        let mut data = SkeletonData {
            reference_scale: 100.0 * scale,
            ..SkeletonData::default()
        };

        // A first byte <= 0x40 may be the length prefix of a 3.8 header,
        // which starts with hash and version strings. Probe on a cursor
        // clone; on mismatch the probe strings are dropped and the stream is
        // decoded from the start as the 4.x layout.
        if bytes.first().is_some_and(|&b| b <= 0x40) {
            let mut probe = input.clone();
            if let (Ok(hash), Ok(Some(version))) = (probe.read_string(), probe.read_string()) {
                let v = version.as_bytes();
                if v.len() >= 3 && v[0] == b'3' && v[1] == b'.' && (b'1'..=b'9').contains(&v[2]) {
                    let format = FormatVersion::lookup(&version)?;
                    data.hash = hash;
                    data.version = Some(version);
                    input = probe;
                    return match format {
                        FormatVersion::V38 => v38::read_skeleton(&mut input, data, scale),
                        FormatVersion::V40 => v40::read_skeleton(&mut input, data, scale),
                        FormatVersion::V42 => v42::read_skeleton(&mut input, data, scale),
                    };
                }
            }
        }

        // 4.x header: two big-endian hash halves printed as lowercase hex
        // (high first), then the version string.
        let high = input.read_i32_be()? as u32 as u64;
        let low = input.read_i32_be()? as u32 as u64;
        data.hash = Some(format!("{:08x}", (high << 32) | low));

        let version = input.read_string()?.unwrap_or_default();
        let format = FormatVersion::lookup(&version)?;
        data.version = Some(version);

        match format {
            FormatVersion::V38 => v38::read_skeleton(&mut input, data, scale),
            FormatVersion::V40 => v40::read_skeleton(&mut input, data, scale),
            FormatVersion::V42 => v42::read_skeleton(&mut input, data, scale),
        }
    }
}
