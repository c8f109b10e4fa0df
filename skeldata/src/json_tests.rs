use crate::{
    AttachmentData, BlendMode, BoneTimeline, Curve, Error, Inherit, PathConstraintTimeline,
    PhysicsConstraintTimeline, SequenceMode, SkeletonData, SlotTimeline, Vertices,
};

fn assert_approx(a: f32, b: f32, eps: f32, ctx: &str) {
    if (a - b).abs() > eps {
        panic!("{ctx}: expected {b}, got {a} (diff {})", (a - b).abs());
    }
}

#[test]
fn header_and_version_dispatch() {
    let json = r#"
{
  "skeleton": { "hash": "deadbeef", "spine": "4.0.64", "x": -5, "y": 2,
                "width": 128, "height": 256, "fps": 24, "images": "./img/",
                "audio": "./snd/" },
  "bones": [ { "name": "root" } ]
}
"#;
    let data = SkeletonData::from_json_str(json).expect("parse");
    assert_eq!(data.hash.as_deref(), Some("deadbeef"));
    assert_eq!(data.version.as_deref(), Some("4.0.64"));
    assert_approx(data.x, -5.0, 1e-6, "x");
    assert_approx(data.reference_scale, 100.0, 1e-6, "reference scale default");
    assert_approx(data.fps, 24.0, 1e-6, "fps");
    assert_eq!(data.images_path.as_deref(), Some("./img/"));
}

#[test]
fn unsupported_version_names_the_offender() {
    let json = r#"{ "skeleton": { "spine": "9.9" } }"#;
    let err = SkeletonData::from_json_str(json).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("version"), "message: {message}");
    assert!(message.contains("9.9"), "message: {message}");
}

#[test]
fn missing_header_is_fatal() {
    let err = SkeletonData::from_json_str(r#"{ "bones": [] }"#).unwrap_err();
    assert!(matches!(err, Error::JsonMissingHeader));
}

#[test]
fn bones_and_slots_resolve_names_to_indices() {
    let json = r#"
{
  "skeleton": { "spine": "4.0.64" },
  "bones": [
    { "name": "root", "x": 4, "y": 8, "length": 16, "rotation": 30 },
    { "name": "limb", "parent": "root", "inherit": "noScale", "skin": true }
  ],
  "slots": [
    { "name": "front", "bone": "limb", "color": "ff00ff80", "blend": "screen" },
    { "name": "back", "bone": "root", "dark": "102030", "attachment": "a" }
  ]
}
"#;
    let data = SkeletonData::from_json_str_with_scale(json, 2.0).expect("parse");
    assert_eq!(data.bones[1].parent, Some(0));
    assert_eq!(data.bones[1].inherit, Inherit::NoScale);
    assert!(data.bones[1].skin_required);
    assert_approx(data.bones[0].x, 8.0, 1e-6, "bone x scales");
    assert_approx(data.bones[0].length, 32.0, 1e-6, "bone length scales");
    assert_approx(data.bones[0].rotation, 30.0, 1e-6, "rotation is unscaled");

    assert_eq!(data.slots[0].bone, 1);
    assert_eq!(data.slots[0].blend, BlendMode::Screen);
    assert_approx(data.slots[0].color[3], 128.0 / 255.0, 1e-6, "slot alpha");
    let dark = data.slots[1].dark_color.expect("dark");
    assert_approx(dark[0], 16.0 / 255.0, 1e-6, "dark r");
    assert_eq!(data.slots[1].attachment.as_deref(), Some("a"));
}

#[test]
fn unknown_bone_parent_is_fatal() {
    let json = r#"
{
  "skeleton": { "spine": "4.0.64" },
  "bones": [ { "name": "limb", "parent": "nope" } ]
}
"#;
    let err = SkeletonData::from_json_str(json).unwrap_err();
    assert!(err.to_string().contains("nope"), "{err}");
}

const SKINNED: &str = r#"
{
  "skeleton": { "spine": "4.0.64" },
  "bones": [ { "name": "root" } ],
  "slots": [ { "name": "body", "bone": "root" } ],
  "skins": [
    {
      "name": "default",
      "attachments": {
        "body": {
          "base": {
            "type": "mesh",
            "uvs": [ 0, 0, 1, 0, 1, 1 ],
            "triangles": [ 0, 1, 2 ],
            "vertices": [ 1, 2, 3, 4, 5, 6 ],
            "hull": 3
          }
        }
      }
    },
    {
      "name": "outfit",
      "bones": [ "root" ],
      "attachments": {
        "body": {
          "link": { "type": "linkedmesh", "parent": "base", "timelines": true }
        }
      }
    }
  ]
}
"#;

#[test]
fn linked_meshes_resolve_across_skins() {
    let data = SkeletonData::from_json_str(SKINNED).expect("parse");
    let outfit = data.skin("outfit").expect("outfit skin");
    assert_eq!(outfit.bones, vec![0]);
    let AttachmentData::Mesh(link) = outfit.attachment(0, "link").expect("link") else {
        panic!("link must be a mesh");
    };
    assert_eq!(
        link.parent,
        Some(("default".to_string(), "base".to_string()))
    );
    assert_eq!(link.triangles, vec![0, 1, 2]);
    assert_eq!(link.hull_length, 6);
    assert_eq!(link.timeline_skin, "default");
    assert_eq!(link.timeline_attachment, "base");
}

#[test]
fn linked_mesh_with_unknown_parent_is_fatal() {
    let json = SKINNED.replace("\"parent\": \"base\"", "\"parent\": \"missing\"");
    let err = SkeletonData::from_json_str(&json).unwrap_err();
    assert!(err.to_string().contains("missing"), "{err}");
}

#[test]
fn weighted_vertices_decode_from_count_prefixed_groups() {
    let json = r#"
{
  "skeleton": { "spine": "4.0.64" },
  "bones": [ { "name": "root" }, { "name": "limb", "parent": "root" } ],
  "slots": [ { "name": "body", "bone": "root" } ],
  "skins": [
    {
      "name": "default",
      "attachments": {
        "body": {
          "m": {
            "type": "mesh",
            "uvs": [ 0, 0, 1, 1 ],
            "triangles": [],
            "vertices": [ 1, 0, 2, 4, 1,   2, 0, 5, 6, 0.5, 1, 7, 8, 0.5 ]
          }
        }
      }
    }
  ]
}
"#;
    let data = SkeletonData::from_json_str_with_scale(json, 2.0).expect("parse");
    let AttachmentData::Mesh(mesh) = data
        .default_skin()
        .and_then(|s| s.attachment(0, "m"))
        .expect("mesh")
    else {
        panic!("must be a mesh");
    };
    let Vertices::Weighted(weights) = &mesh.vertices else {
        panic!("must be weighted");
    };
    assert_eq!(weights.len(), 2);
    assert_eq!(weights[0].len(), 1);
    assert_eq!(weights[1].len(), 2);
    assert_eq!(weights[0][0].bone, 0);
    assert_approx(weights[0][0].x, 4.0, 1e-6, "weighted x scales");
    assert_approx(weights[0][0].weight, 1.0, 1e-6, "weight is unscaled");
    assert_eq!(weights[1][1].bone, 1);
}

#[test]
fn animation_timelines_resolve_and_track_duration() {
    let json = r#"
{
  "skeleton": { "spine": "4.0.64" },
  "bones": [ { "name": "root" } ],
  "slots": [
    { "name": "a", "bone": "root" },
    { "name": "b", "bone": "root" },
    { "name": "c", "bone": "root" }
  ],
  "events": {
    "step": { "int": 2, "audio": "step.ogg" }
  },
  "animations": {
    "walk": {
      "slots": {
        "a": {
          "attachment": [ { "time": 0, "name": "x" }, { "time": 0.5 } ],
          "rgba": [
            { "time": 0, "color": "ff000080", "curve": "stepped" },
            { "time": 1, "color": "00ff00ff" }
          ],
          "alpha": [ { "time": 0 }, { "time": 0.25, "value": 0.5 } ]
        }
      },
      "bones": {
        "root": {
          "rotate": [
            { "time": 0, "value": 10, "curve": [ 0.25, 2.5, 0.75, 10 ] },
            { "time": 1.5, "value": 90 }
          ],
          "translate": [
            { "time": 0, "x": 3, "y": 4,
              "curve": [ 0.1, 1, 0.2, 3, 0.3, 2, 0.4, 4 ] },
            { "time": 1 }
          ]
        }
      },
      "drawOrder": [
        { "time": 2, "offsets": [ { "slot": "a", "offset": 2 } ] },
        { "time": 2.5 }
      ],
      "events": [
        { "time": 1.75, "name": "step", "int": 9, "volume": 0.3 }
      ]
    }
  }
}
"#;
    let data = SkeletonData::from_json_str_with_scale(json, 2.0).expect("parse");
    let anim = data.animation("walk").expect("animation");
    assert_approx(anim.duration, 2.5, 1e-6, "duration");

    let SlotTimeline::Attachment(attachment) = &anim.slot_timelines[0] else {
        panic!("first slot timeline must be attachment");
    };
    assert_eq!(attachment.frames[1].name, None);

    let SlotTimeline::Rgba(rgba) = &anim.slot_timelines[1] else {
        panic!("second slot timeline must be rgba");
    };
    assert_eq!(rgba.frames[0].curve, [Curve::Stepped; 4]);
    assert_approx(rgba.frames[0].color[3], 128.0 / 255.0, 1e-6, "alpha");

    let SlotTimeline::Alpha(alpha) = &anim.slot_timelines[2] else {
        panic!("third slot timeline must be alpha");
    };
    // Missing value defaults to 1.
    assert_approx(alpha.frames[0].alpha, 1.0, 1e-6, "alpha default");
    assert_approx(alpha.frames[1].alpha, 0.5, 1e-6, "alpha keyed");

    let BoneTimeline::Rotate(rotate) = &anim.bone_timelines[0] else {
        panic!("first bone timeline must be rotate");
    };
    let Curve::Bezier { cx1, cy1, .. } = rotate.frames[0].curve else {
        panic!("rotate must be bezier");
    };
    assert_approx(cx1, 0.25, 1e-6, "cx1");
    // Rotation control values are unscaled.
    assert_approx(cy1, 2.5, 1e-6, "cy1");

    let BoneTimeline::Translate(translate) = &anim.bone_timelines[1] else {
        panic!("second bone timeline must be translate");
    };
    assert_approx(translate.frames[0].x, 6.0, 1e-6, "translate x scales");
    let Curve::Bezier { cy1, .. } = translate.frames[0].curve[0] else {
        panic!("translate channel 0 must be bezier");
    };
    // Translate control values scale with the channel.
    assert_approx(cy1, 2.0, 1e-6, "translate cy1 scales");
    let Curve::Bezier { cx1, .. } = translate.frames[0].curve[1] else {
        panic!("translate channel 1 must be bezier");
    };
    assert_approx(cx1, 0.3, 1e-6, "translate channel 1 cx1");

    let draw_order = anim.draw_order_timeline.as_ref().expect("draw order");
    assert_eq!(
        draw_order.frames[0].draw_order.as_deref(),
        Some([1usize, 2, 0].as_slice())
    );
    // A frame without offsets keys the setup order.
    assert_eq!(draw_order.frames[1].draw_order, None);

    let events = anim.event_timeline.as_ref().expect("events");
    let frame = &events.events[0];
    assert_eq!(frame.int_value, 9);
    assert_approx(frame.float_value, 0.0, 1e-6, "float inherited");
    assert_approx(frame.volume, 0.3, 1e-6, "volume keyed");
}

#[test]
fn deform_timelines_add_setup_vertices_for_unweighted_meshes() {
    let json = r#"
{
  "skeleton": { "spine": "4.0.64" },
  "bones": [ { "name": "root" } ],
  "slots": [ { "name": "body", "bone": "root" } ],
  "skins": [
    {
      "name": "default",
      "attachments": {
        "body": {
          "m": {
            "type": "mesh",
            "uvs": [ 0, 0, 1, 1 ],
            "triangles": [],
            "vertices": [ 1, 2, 3, 4 ]
          }
        }
      }
    }
  ],
  "animations": {
    "bend": {
      "attachments": {
        "default": {
          "body": {
            "m": {
              "deform": [
                { "time": 0 },
                { "time": 1, "offset": 1, "vertices": [ 10, 20 ] }
              ]
            }
          }
        }
      }
    }
  }
}
"#;
    let data = SkeletonData::from_json_str(json).expect("parse");
    let deform = &data.animations[0].deform_timelines[0];
    assert_eq!(deform.skin, "default");
    assert_eq!(deform.frames[0].vertices, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(deform.frames[1].vertices, vec![1.0, 12.0, 23.0, 4.0]);
}

#[test]
fn v42_physics_sequences_and_inherit() {
    let json = r#"
{
  "skeleton": { "spine": "4.2.33" },
  "bones": [ { "name": "root" } ],
  "slots": [ { "name": "s", "bone": "root" } ],
  "physics": [
    { "name": "phys", "bone": "root", "x": 1.5, "mass": 4, "strength": 60,
      "inertiaGlobal": true }
  ],
  "skins": [
    {
      "name": "default",
      "attachments": {
        "s": {
          "spr": {
            "width": 10, "height": 12,
            "sequence": { "count": 4, "start": 2, "digits": 3, "setup": 1 }
          }
        }
      }
    }
  ],
  "animations": {
    "a": {
      "bones": {
        "root": {
          "inherit": [ { "time": 0, "inherit": "onlyTranslation" } ]
        }
      },
      "physics": {
        "": { "reset": [ { "time": 0.5 } ] },
        "phys": { "inertia": [ { "time": 0, "value": 0.25 } ] }
      },
      "attachments": {
        "default": {
          "s": {
            "spr": {
              "sequence": [ { "time": 0, "mode": "pingpong", "index": 2, "delay": 0.5 } ]
            }
          }
        }
      }
    }
  }
}
"#;
    let data = SkeletonData::from_json_str(json).expect("parse");

    let phys = &data.physics_constraints[0];
    assert_approx(phys.x, 1.5, 1e-6, "physics x");
    assert_approx(phys.mass_inverse, 0.25, 1e-6, "mass inverse");
    assert_approx(phys.strength, 60.0, 1e-6, "strength");
    assert_approx(phys.limit, 5000.0, 1e-3, "limit default");
    assert_approx(phys.step, 1.0 / 60.0, 1e-6, "step default");
    assert!(phys.inertia_global);

    let AttachmentData::Region(region) = data
        .default_skin()
        .and_then(|s| s.attachment(0, "spr"))
        .expect("region")
    else {
        panic!("spr must be a region");
    };
    let sequence = region.sequence.as_ref().expect("sequence");
    assert_eq!(sequence.count, 4);
    assert_eq!(sequence.start, 2);
    assert_eq!(sequence.setup_index, 1);

    let anim = data.animation("a").expect("animation");
    let BoneTimeline::Inherit(inherit) = &anim.bone_timelines[0] else {
        panic!("bone timeline must be inherit");
    };
    assert_eq!(inherit.frames[0].inherit, Inherit::OnlyTranslation);

    assert_eq!(anim.physics_constraint_timelines.len(), 2);
    let PhysicsConstraintTimeline::Reset(reset) = &anim.physics_constraint_timelines[0] else {
        panic!("first physics timeline must be reset");
    };
    assert_eq!(reset.constraint_index, -1);
    let PhysicsConstraintTimeline::Inertia(inertia) = &anim.physics_constraint_timelines[1] else {
        panic!("second physics timeline must be inertia");
    };
    assert_eq!(inertia.constraint_index, 0);
    assert_approx(inertia.frames[0].value, 0.25, 1e-6, "inertia value");

    let sequence_tl = &anim.sequence_timelines[0];
    assert_eq!(sequence_tl.frames[0].mode, SequenceMode::PingPong);
    assert_eq!(sequence_tl.frames[0].index, 2);
}

#[test]
fn v40_documents_ignore_physics_sections() {
    // A 4.0 reader never materializes 4.2-only features even when the keys
    // are present.
    let json = r#"
{
  "skeleton": { "spine": "4.0.64" },
  "bones": [ { "name": "root" } ],
  "physics": [ { "name": "phys", "bone": "root" } ]
}
"#;
    let data = SkeletonData::from_json_str(json).expect("parse");
    assert!(data.physics_constraints.is_empty());
}

#[test]
fn path_constraint_mix_y_defaults_to_mix_x() {
    let json = r#"
{
  "skeleton": { "spine": "4.0.64" },
  "bones": [ { "name": "root" } ],
  "slots": [ { "name": "s", "bone": "root" } ],
  "path": [
    { "name": "pc", "bones": [ "root" ], "target": "s",
      "positionMode": "fixed", "spacingMode": "length",
      "position": 3, "spacing": 5, "mixX": 0.25 }
  ],
  "animations": {
    "a": {
      "path": {
        "pc": {
          "position": [ { "time": 0, "value": 7 } ],
          "mix": [ { "time": 0, "mixRotate": 0.5, "mixX": 0.75 } ]
        }
      }
    }
  }
}
"#;
    let data = SkeletonData::from_json_str_with_scale(json, 2.0).expect("parse");
    let pc = &data.path_constraints[0];
    assert_approx(pc.position, 6.0, 1e-6, "fixed position scales");
    assert_approx(pc.spacing, 10.0, 1e-6, "length spacing scales");
    assert_approx(pc.mix_x, 0.25, 1e-6, "mix x");
    assert_approx(pc.mix_y, 0.25, 1e-6, "mix y defaults to mix x");

    let anim = &data.animations[0];
    let PathConstraintTimeline::Position(position) = &anim.path_constraint_timelines[0] else {
        panic!("first path timeline must be position");
    };
    assert_approx(position.frames[0].value, 14.0, 1e-6, "timeline value scales");
    let PathConstraintTimeline::Mix(mix) = &anim.path_constraint_timelines[1] else {
        panic!("second path timeline must be mix");
    };
    assert_approx(mix.frames[0].mix_y, 0.75, 1e-6, "timeline mix y follows x");
}

#[test]
fn unknown_animation_references_are_fatal() {
    let json = r#"
{
  "skeleton": { "spine": "4.0.64" },
  "bones": [ { "name": "root" } ],
  "animations": {
    "a": { "bones": { "ghost": { "rotate": [ { "time": 0 } ] } } }
  }
}
"#;
    let err = SkeletonData::from_json_str(json).unwrap_err();
    assert!(err.to_string().contains("ghost"), "{err}");

    let json = r#"
{
  "skeleton": { "spine": "4.0.64" },
  "bones": [ { "name": "root" } ],
  "animations": {
    "a": { "events": [ { "time": 0, "name": "missing" } ] }
  }
}
"#;
    let err = SkeletonData::from_json_str(json).unwrap_err();
    assert!(err.to_string().contains("missing"), "{err}");
}
