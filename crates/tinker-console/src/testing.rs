//! Shared test fixtures: a recording host and a small reflected world.

use std::rc::Rc;

use tinker_eval::{Kind, ParamInfo, Reflect, TypeBuilder, TypeRef, Value};

use crate::host::Host;

pub(crate) struct Player {
    pub hp: i64,
    pub name: String,
}

pub(crate) struct Arena {
    pub score: i64,
    pub player: Value,
}

thread_local! {
    static PLAYER: TypeRef = TypeBuilder::new("Player")
        .field::<Player>("hp", Kind::Int, |p| Value::Int(p.hp), |p, v| {
            p.hp = v.as_int().unwrap_or_default();
        })
        .field::<Player>("name", Kind::Str, |p| Value::Str(p.name.clone()), |p, v| {
            p.name = v.to_string();
        })
        .method::<Player>("Heal", vec![ParamInfo::new("amount", Kind::Int).with_default(5)], Kind::Int, |p, args| {
            p.hp += args[0].as_int()?;
            Ok(Value::Int(p.hp))
        })
        .build();

    static ARENA: TypeRef = {
        let player = PLAYER.with(Rc::clone);
        TypeBuilder::new("Arena")
            .field::<Arena>("score", Kind::Int, |a| Value::Int(a.score), |a, v| {
                a.score = v.as_int().unwrap_or_default();
            })
            .readonly_field::<Arena>("player", Kind::from_type(&player), |a| a.player.clone())
            .property::<Arena>("Item[0]", Kind::Int, |_| Value::Int(0))
            .nested(&player)
            .build()
    };
}

impl Reflect for Player {
    fn type_info(&self) -> TypeRef {
        PLAYER.with(Rc::clone)
    }
}

impl Reflect for Arena {
    fn type_info(&self) -> TypeRef {
        ARENA.with(Rc::clone)
    }
}

pub(crate) fn arena() -> Value {
    Value::object(Arena {
        score: 0,
        player: Value::object(Player {
            hp: 10,
            name: "hero".to_string(),
        }),
    })
}

/// Host that records every request made through it.
pub(crate) struct RecordingHost {
    pub root: Value,
    pub exit_requested: bool,
    pub vsync: Option<bool>,
    pub fixed_timestep: Option<bool>,
    pub framerate: Option<f32>,
    pub input_toggles: Vec<bool>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            root: arena(),
            exit_requested: false,
            vsync: None,
            fixed_timestep: None,
            framerate: None,
            input_toggles: Vec::new(),
        }
    }
}

impl Host for RecordingHost {
    fn root(&self) -> Value {
        self.root.clone()
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = Some(enabled);
    }

    fn set_fixed_timestep(&mut self, enabled: bool) {
        self.fixed_timestep = Some(enabled);
    }

    fn set_target_framerate(&mut self, fps: f32) {
        self.framerate = Some(fps);
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_toggles.push(enabled);
    }
}
