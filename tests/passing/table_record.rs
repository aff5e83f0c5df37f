use serde::{Deserialize, Serialize};
use sheetbake::{Record, TableRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
#[record(table)]
pub struct Skill {
    #[data(id)]
    id: u32,
    #[data(mutable)]
    name: String,
    #[data]
    cooldown: f32,
}

fn main() {
    let mut skill = Skill { id: 3, name: "blink".into(), cooldown: 1.5 };
    skill.set_name("shadow step".to_string());
    assert_eq!(skill.get_id(), 3);
    assert_eq!(skill.name(), "shadow step");
    assert_eq!(skill.cooldown(), 1.5);
    assert_eq!(Skill::schema().fields.len(), 3);
}
