use serde::{Deserialize, Serialize};
use sheetbake::{AssetRef, CellError, ContainerSchema, Converter, Record, SheetRef};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
}

pub struct RarityConverter;

impl Converter for RarityConverter {
    type Input = String;
    type Output = Rarity;

    fn convert(input: String) -> Result<Rarity, CellError> {
        match input.trim().to_lowercase().as_str() {
            "" | "common" => Ok(Rarity::Common),
            "rare" => Ok(Rarity::Rare),
            "epic" => Ok(Rarity::Epic),
            _ => Err(CellError::parse(&input, "rarity")),
        }
    }

    fn revert(output: &Rarity) -> String {
        match output {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
pub struct Multiplier {
    #[data]
    pub level: u32,
    #[data]
    pub hp: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
#[record(table)]
pub struct Hero {
    #[data(id)]
    pub id: u32,
    #[data]
    pub name: String,
    #[data]
    pub weapon: SheetRef<Item>,
    #[data]
    pub portrait: AssetRef,
    #[data(vertical)]
    pub multipliers: Vec<Multiplier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
#[record(table)]
pub struct Item {
    #[data(id)]
    pub id: String,
    #[data]
    pub name: String,
    #[data]
    pub price: u32,
    #[data(convert(with = RarityConverter, input = String, output = Rarity))]
    pub rarity: Rarity,
    #[data]
    pub icon: AssetRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
#[record(table)]
pub struct Note {
    #[data(id)]
    pub id: String,
    #[data]
    pub name: String,
}

/// Heroes are declared before the items they reference.
pub fn heroes_schema() -> ContainerSchema {
    ContainerSchema::new().sheet::<Hero>("Heroes").sheet::<Item>("Items").sheet::<Note>("<Notes>")
}
