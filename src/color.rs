use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a category field (vehicle type, region) to
/// colours, so the same category keeps its colour across every chart.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given column from its distinct values.
    pub fn new(column: &str, distinct: &BTreeSet<Value>) -> Self {
        let palette = generate_palette(distinct.len());
        let mapping: BTreeMap<Value, Color32> = distinct
            .iter()
            .cloned()
            .zip(palette)
            .collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: Color32::LIGHT_BLUE,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Colour for an aggregate key when it is keyed by this map's column.
    pub fn color_for_key(&self, key_fields: &[String], key: &[Value]) -> Color32 {
        match (key_fields, key) {
            ([field], [value]) if *field == self.column => self.color_for(value),
            _ => self.default_color,
        }
    }

    /// Return the legend entries (value label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(v, c)| (v.to_string(), *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        let p = generate_palette(7);
        assert_eq!(p.len(), 7);
        let unique: BTreeSet<[u8; 4]> = p.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 7);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_color_map_lookup() {
        let values: BTreeSet<Value> = ["NSW", "VI", "WA"].into_iter().map(Value::from).collect();
        let map = ColorMap::new("Region", &values);
        let nsw = map.color_for(&Value::from("NSW"));
        assert_ne!(nsw, map.color_for(&Value::from("WA")));
        assert_eq!(map.color_for(&Value::from("XX")), Color32::LIGHT_BLUE);
        let labels: Vec<String> = map.legend_entries().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["NSW", "VI", "WA"]);

        let fields = vec!["Region".to_string()];
        assert_eq!(map.color_for_key(&fields, &[Value::from("NSW")]), nsw);
        let other = vec!["Year".to_string()];
        assert_eq!(
            map.color_for_key(&other, &[Value::Integer(2005)]),
            Color32::LIGHT_BLUE
        );
    }
}
