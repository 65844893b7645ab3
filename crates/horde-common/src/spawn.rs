use std::collections::BTreeMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Enemy type used when a map has no row in the spawn table.
pub const FALLBACK_KIND: u8 = 0;

// -- Arena geometry --

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    /// Distance beyond the border at which enemies appear.
    pub spawn_offset: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 768.0,
            spawn_offset: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    /// Picks the axis first, then the near or far side on it.
    pub fn random(rng: &mut impl Rng) -> Self {
        let far = rng.gen_bool(0.5);
        match (rng.gen_bool(0.5), far) {
            (true, false) => Edge::Left,
            (true, true) => Edge::Right,
            (false, false) => Edge::Top,
            (false, true) => Edge::Bottom,
        }
    }
}

impl Arena {
    /// A point just outside `edge`, uniformly placed along it.
    pub fn point_on(&self, edge: Edge, rng: &mut impl Rng) -> (f32, f32) {
        match edge {
            Edge::Left => (-self.spawn_offset, rng.gen_range(0.0..=self.height)),
            Edge::Right => (
                self.width + self.spawn_offset,
                rng.gen_range(0.0..=self.height),
            ),
            Edge::Top => (rng.gen_range(0.0..=self.width), -self.spawn_offset),
            Edge::Bottom => (
                rng.gen_range(0.0..=self.width),
                self.height + self.spawn_offset,
            ),
        }
    }
}

// -- Spawn table --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weighted {
    pub kind: u8,
    pub weight: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SpawnTableError {
    #[error("map {0} has no enemy types")]
    EmptyRow(u8),
    #[error("map {0} has a zero total weight")]
    ZeroWeight(u8),
    #[error("invalid spawn table: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-map distribution over enemy types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnTable {
    rows: BTreeMap<u8, Vec<Weighted>>,
}

impl SpawnTable {
    pub fn empty() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// Parses `{"<map>": [{"kind": k, "weight": w}, ...], ...}`.
    pub fn from_json(text: &str) -> Result<Self, SpawnTableError> {
        let table: SpawnTable = serde_json::from_str(text)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), SpawnTableError> {
        for (&map, row) in &self.rows {
            if row.is_empty() {
                return Err(SpawnTableError::EmptyRow(map));
            }
            if row.iter().all(|w| w.weight == 0) {
                return Err(SpawnTableError::ZeroWeight(map));
            }
        }
        Ok(())
    }

    pub fn with_row(mut self, map: u8, row: Vec<Weighted>) -> Self {
        self.rows.insert(map, row);
        self
    }

    pub fn row(&self, map: u8) -> Option<&[Weighted]> {
        self.rows.get(&map).map(Vec::as_slice)
    }

    pub fn pick_kind(&self, map: u8, rng: &mut impl Rng) -> u8 {
        let Some(row) = self.row(map) else {
            return FALLBACK_KIND;
        };
        match WeightedIndex::new(row.iter().map(|w| w.weight)) {
            Ok(dist) => row[dist.sample(rng)].kind,
            Err(_) => FALLBACK_KIND,
        }
    }
}

impl Default for SpawnTable {
    fn default() -> Self {
        Self::empty()
            .with_row(0, vec![Weighted { kind: 0, weight: 1 }])
            .with_row(
                1,
                vec![
                    Weighted { kind: 0, weight: 80 },
                    Weighted { kind: 1, weight: 20 },
                ],
            )
            .with_row(2, vec![Weighted { kind: 2, weight: 1 }])
    }
}

// -- Spawn events --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEvent {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: u8,
}

pub fn synthesize(table: &SpawnTable, arena: &Arena, map: u8, rng: &mut impl Rng) -> SpawnEvent {
    let (x, y) = arena.point_on(Edge::random(rng), rng);
    SpawnEvent {
        id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid(),
        x,
        y,
        kind: table.pick_kind(map, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_map_zero_always_type_zero() {
        let table = SpawnTable::default();
        let mut rng = rng();
        assert!((0..2000).all(|_| table.pick_kind(0, &mut rng) == 0));
    }

    #[test]
    fn test_map_two_always_type_two() {
        let table = SpawnTable::default();
        let mut rng = rng();
        assert!((0..2000).all(|_| table.pick_kind(2, &mut rng) == 2));
    }

    #[test]
    fn test_map_one_matches_configured_ratio() {
        let table = SpawnTable::default();
        let mut rng = rng();
        let samples = 20_000;
        let type_one = (0..samples)
            .filter(|_| table.pick_kind(1, &mut rng) == 1)
            .count();
        let fraction = type_one as f64 / samples as f64;
        assert!((0.18..0.22).contains(&fraction), "fraction was {fraction}");
    }

    #[test]
    fn test_tuned_ratio_is_respected() {
        let table = SpawnTable::default().with_row(
            1,
            vec![
                Weighted { kind: 0, weight: 70 },
                Weighted { kind: 1, weight: 30 },
            ],
        );
        let mut rng = rng();
        let samples = 20_000;
        let type_one = (0..samples)
            .filter(|_| table.pick_kind(1, &mut rng) == 1)
            .count();
        let fraction = type_one as f64 / samples as f64;
        assert!((0.28..0.32).contains(&fraction), "fraction was {fraction}");
    }

    #[test]
    fn test_unknown_map_falls_back() {
        let table = SpawnTable::default();
        let mut rng = rng();
        assert_eq!(table.pick_kind(9, &mut rng), FALLBACK_KIND);
    }

    #[test]
    fn test_from_json() {
        let table = SpawnTable::from_json(
            r#"{"0": [{"kind": 0, "weight": 1}], "1": [{"kind": 0, "weight": 3}, {"kind": 1, "weight": 1}]}"#,
        )
        .unwrap();
        assert_eq!(table.row(1).map(<[Weighted]>::len), Some(2));
        assert!(table.row(2).is_none());
    }

    #[test]
    fn test_from_json_rejects_bad_rows() {
        assert!(matches!(
            SpawnTable::from_json(r#"{"3": []}"#),
            Err(SpawnTableError::EmptyRow(3))
        ));
        assert!(matches!(
            SpawnTable::from_json(r#"{"1": [{"kind": 1, "weight": 0}]}"#),
            Err(SpawnTableError::ZeroWeight(1))
        ));
        assert!(matches!(
            SpawnTable::from_json("not json"),
            Err(SpawnTableError::Json(_))
        ));
    }

    #[test]
    fn test_spawns_land_just_outside_one_edge() {
        let arena = Arena::default();
        let table = SpawnTable::default();
        let mut rng = rng();
        let mut seen = [false; 4];
        for _ in 0..500 {
            let event = synthesize(&table, &arena, 0, &mut rng);
            let edge = if event.x == -50.0 {
                0
            } else if event.x == 1330.0 {
                1
            } else if event.y == -50.0 {
                2
            } else if event.y == 818.0 {
                3
            } else {
                panic!("spawn inside arena: ({}, {})", event.x, event.y);
            };
            seen[edge] = true;
            if edge < 2 {
                assert!((0.0..=768.0).contains(&event.y));
            } else {
                assert!((0.0..=1280.0).contains(&event.x));
            }
        }
        assert!(seen.iter().all(|s| *s), "not every edge was used");
    }

    #[test]
    fn test_spawn_ids_are_distinct() {
        let arena = Arena::default();
        let table = SpawnTable::default();
        let mut rng = rng();
        let a = synthesize(&table, &arena, 1, &mut rng);
        let b = synthesize(&table, &arena, 1, &mut rng);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_spawn_event_wire_format() {
        let event = SpawnEvent {
            id: Uuid::nil(),
            x: -50.0,
            y: 100.0,
            kind: 1,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], 1);
        assert_eq!(value["x"], -50.0);
        assert!(value.get("kind").is_none());
    }
}
