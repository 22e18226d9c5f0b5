//! The demo game world exposed to the console.

use std::cell::RefCell;
use std::rc::Rc;

use tinker_eval::reflect::with_ref;
use tinker_eval::{BinaryOp, EnumValue, Kind, ObjectRef, ParamInfo, Reflect, TypeBuilder, TypeRef, Value};

pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

pub struct Player {
    pub name: String,
    pub hp: i64,
    pub speed: f32,
    pub facing: i64,
    pub position: ObjectRef,
}

impl Player {
    pub fn new(name: &str, hp: i64) -> Self {
        Self {
            name: name.to_string(),
            hp,
            speed: 4.0,
            facing: 0,
            position: Rc::new(RefCell::new(Vector2 { x: 0.0, y: 0.0 })),
        }
    }
}

/// Root object of the demo.
pub struct Game {
    pub player: ObjectRef,
    pub gravity: f32,
    pub time_scale: f32,
    pub paused: bool,
    pub frame: i64,
}

impl Game {
    pub fn new() -> Self {
        Self {
            player: Rc::new(RefCell::new(Player::new("hero", 100))),
            gravity: -9.81,
            time_scale: 1.0,
            paused: false,
            frame: 0,
        }
    }
}

struct Types {
    game: TypeRef,
    player: TypeRef,
    vector2: TypeRef,
}

thread_local! {
    static TYPES: Types = Types::build();
}

fn vector(x: f32, y: f32) -> Value {
    Value::object(Vector2 { x, y })
}

fn components(v: &Value) -> tinker_types::error::Result<(f32, f32)> {
    with_ref(v, |v: &Vector2| (v.x, v.y))
}

impl Types {
    fn build() -> Self {
        let vector2 = TypeBuilder::new("Vector2")
            .field::<Vector2>("x", Kind::Float, |v| Value::Float(v.x), |v, val| {
                v.x = val.as_float().unwrap_or_default();
            })
            .field::<Vector2>("y", Kind::Float, |v| Value::Float(v.y), |v, val| {
                v.y = val.as_float().unwrap_or_default();
            })
            .property::<Vector2>("Length", Kind::Float, |v| Value::Float(v.x.hypot(v.y)))
            .static_property("Zero", Kind::Own, || vector(0.0, 0.0))
            .constructor(
                vec![
                    ParamInfo::new("x", Kind::Float),
                    ParamInfo::new("y", Kind::Float).with_default(0.0f32),
                ],
                |args| Ok(vector(args[0].as_float()?, args[1].as_float()?)),
            )
            .operator(BinaryOp::Add, Kind::Own, Kind::Own, |l, r| {
                let ((ax, ay), (bx, by)) = (components(l)?, components(r)?);
                Ok(vector(ax + bx, ay + by))
            })
            .operator(BinaryOp::Sub, Kind::Own, Kind::Own, |l, r| {
                let ((ax, ay), (bx, by)) = (components(l)?, components(r)?);
                Ok(vector(ax - bx, ay - by))
            })
            .operator(BinaryOp::Mul, Kind::Own, Kind::Float, |l, r| {
                let (x, y) = components(l)?;
                let k = r.as_float()?;
                Ok(vector(x * k, y * k))
            })
            .build();

        let facing = TypeBuilder::enumeration(
            "Facing",
            &[("North", 0), ("East", 1), ("South", 2), ("West", 3)],
        )
        .build();

        let facing_type = Rc::clone(&facing);
        let player = TypeBuilder::new("Player")
            .field::<Player>(
                "name",
                Kind::Str,
                |p| Value::from(p.name.as_str()),
                |p, v| p.name = v.to_string(),
            )
            .field::<Player>("hp", Kind::Int, |p| Value::Int(p.hp), |p, v| {
                p.hp = v.as_int().unwrap_or_default();
            })
            .field::<Player>("speed", Kind::Float, |p| Value::Float(p.speed), |p, v| {
                p.speed = v.as_float().unwrap_or_default();
            })
            .field::<Player>(
                "facing",
                Kind::Type(Rc::clone(&facing)),
                move |p| {
                    Value::Enum(EnumValue {
                        ty: Rc::clone(&facing_type),
                        ordinal: p.facing,
                    })
                },
                |p, v| p.facing = v.as_int().unwrap_or_default(),
            )
            .property_mut::<Player>(
                "position",
                Kind::Type(Rc::clone(&vector2)),
                |p| Value::Object(Rc::clone(&p.position)),
                |p, v| {
                    p.position = Rc::clone(v.as_object()?);
                    Ok(())
                },
            )
            .property::<Player>("Alive", Kind::Bool, |p| Value::Bool(p.hp > 0))
            .method::<Player>(
                "Heal",
                vec![ParamInfo::new("amount", Kind::Int).with_default(10)],
                Kind::Int,
                |p, args| {
                    p.hp += args[0].as_int()?;
                    Ok(Value::Int(p.hp))
                },
            )
            .method::<Player>(
                "Teleport",
                vec![ParamInfo::new("x", Kind::Float), ParamInfo::new("y", Kind::Float)],
                Kind::Void,
                |p, args| {
                    p.position = Rc::new(RefCell::new(Vector2 {
                        x: args[0].as_float()?,
                        y: args[1].as_float()?,
                    }));
                    Ok(Value::Null)
                },
            )
            .build();

        let player_type = Rc::clone(&player);
        let game = TypeBuilder::new("Game")
            .readonly_field::<Game>("player", Kind::Type(Rc::clone(&player)), |g| {
                Value::Object(Rc::clone(&g.player))
            })
            .field::<Game>("gravity", Kind::Float, |g| Value::Float(g.gravity), |g, v| {
                g.gravity = v.as_float().unwrap_or_default();
            })
            .field::<Game>("timeScale", Kind::Float, |g| Value::Float(g.time_scale), |g, v| {
                g.time_scale = v.as_float().unwrap_or_default();
            })
            .field::<Game>("paused", Kind::Bool, |g| Value::Bool(g.paused), |g, v| {
                g.paused = v.as_bool().unwrap_or_default();
            })
            .property::<Game>("Frame", Kind::Int, |g| Value::Int(g.frame))
            .static_property("Version", Kind::Str, || Value::from(env!("CARGO_PKG_VERSION")))
            .nested(&vector2)
            .nested(&player)
            .nested(&facing)
            .method::<Game>(
                "Spawn",
                vec![
                    ParamInfo::new("name", Kind::Str),
                    ParamInfo::new("hp", Kind::Int).with_default(100),
                ],
                Kind::Type(player_type),
                |_, args| Ok(Value::object(Player::new(args[0].as_str()?, args[1].as_int()?))),
            )
            .build();

        Self {
            game,
            player,
            vector2,
        }
    }
}

impl Reflect for Vector2 {
    fn type_info(&self) -> TypeRef {
        TYPES.with(|t| Rc::clone(&t.vector2))
    }

    fn describe(&self) -> String {
        format!("({}, {})", self.x, self.y)
    }
}

impl Reflect for Player {
    fn type_info(&self) -> TypeRef {
        TYPES.with(|t| Rc::clone(&t.player))
    }

    fn describe(&self) -> String {
        format!("Player {} ({} hp)", self.name, self.hp)
    }
}

impl Reflect for Game {
    fn type_info(&self) -> TypeRef {
        TYPES.with(|t| Rc::clone(&t.game))
    }
}

#[cfg(test)]
mod tests {
    use tinker_eval::{EvalOptions, Evaluator, Outcome};

    use super::*;

    fn eval(root: &Value, source: &str) -> String {
        match Evaluator::new(EvalOptions::default()).evaluate(source, root).unwrap() {
            Outcome::Value(v) => v.to_string(),
            Outcome::Members(m) => m.len().to_string(),
        }
    }

    #[test]
    fn vector_arithmetic() {
        let root = Value::object(Game::new());
        assert_eq!(eval(&root, "new Vector2(1f, 2f) + new Vector2(3f)"), "(4, 2)");
        assert_eq!(eval(&root, "new Vector2(3f, 4f).Length"), "5");
    }

    #[test]
    fn player_state_is_live() {
        let root = Value::object(Game::new());
        eval(&root, "player.Teleport(2f, 3f)");
        assert_eq!(eval(&root, "player.position"), "(2, 3)");
        eval(&root, "player.facing = Facing.West");
        assert_eq!(eval(&root, "player.facing"), "West");
        assert_eq!(eval(&root, "Spawn(\"imp\", 5)"), "Player imp (5 hp)");
    }
}
