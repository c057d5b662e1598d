use serde::{Deserialize, Serialize};
use std::fmt;
use time::macros::format_description;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    pub area_m2: f32,
    pub width_m: f32,
    pub depth_m: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub from: String,
    pub to: String,
    pub distance_m: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadProximity {
    pub id: String,
    pub distance_m: f32,
    pub note: String,
}

/// Building footprint analysis produced by an area mapping pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSurvey {
    pub buildings: Vec<Building>,
    pub spacings: Vec<Spacing>,
    pub orientation: String,
    pub orientation_notes: String,
    pub total_area_m2: f32,
    pub road_proximity: Vec<RoadProximity>,
}

impl BuildingSurvey {
    pub fn built_area_m2(&self) -> f32 {
        self.buildings.iter().map(|b| b.area_m2).sum()
    }

    /// Built area over total surveyed area, in percent.
    pub fn density_pct(&self) -> f32 {
        if self.total_area_m2 <= 0.0 {
            return 0.0;
        }
        self.built_area_m2() / self.total_area_m2 * 100.0
    }

    pub fn road_distance(&self, id: &str) -> Option<&RoadProximity> {
        self.road_proximity.iter().find(|r| r.id == id)
    }

    /// The fixed survey returned by the simulated device.
    pub fn sample() -> Self {
        let b = |id: &str, area_m2, width_m, depth_m| Building { id: id.into(), area_m2, width_m, depth_m };
        let s = |from: &str, to: &str, distance_m| Spacing { from: from.into(), to: to.into(), distance_m };
        Self {
            buildings: vec![
                b("B1", 25.0, 5.0, 5.0),
                b("B2", 22.0, 4.5, 5.0),
                b("B3", 28.0, 5.0, 5.5),
                b("B4", 30.0, 5.5, 5.5),
                b("B5", 35.0, 6.0, 6.0),
            ],
            spacings: vec![s("B1", "B2", 3.0), s("B3", "B4", 4.0), s("B4", "B5", 6.0), s("B2", "B5", 5.0)],
            orientation: "Northwest-Southeast".into(),
            orientation_notes: "B5: Slightly tilted compared to the other buildings".into(),
            total_area_m2: 200.0,
            road_proximity: vec![
                RoadProximity { id: "B5".into(), distance_m: 2.0, note: "Closest to the road".into() },
                RoadProximity { id: "B1".into(), distance_m: 5.0, note: "Farthest from the road".into() },
            ],
        }
    }
}

/// Result attached to a completed mapping operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingReport {
    pub area_m2: f32,
    pub resolution: String,
    pub completed_unix_ms: i64,
    pub survey: BuildingSurvey,
}

impl MappingReport {
    pub fn completed_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(self.completed_unix_ms as i128 * 1_000_000).ok()
    }
}

// Printable report, one section per table on the mapping panel.
impl fmt::Display for MappingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = self
            .completed_at()
            .and_then(|t| t.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC")).ok())
            .unwrap_or_else(|| "unknown".into());
        let sv = &self.survey;

        writeln!(f, "BUILDING MAPPING REPORT")?;
        writeln!(f, "completed:  {}", stamp)?;
        writeln!(f, "area:       {} m²", self.area_m2)?;
        writeln!(f, "resolution: {}", self.resolution)?;
        writeln!(f)?;
        writeln!(f, "{:<4} {:>8} {:>14} {:>10}", "id", "area", "dimensions", "road")?;
        for b in &sv.buildings {
            let road = sv.road_distance(&b.id).map(|r| format!("{} m", r.distance_m)).unwrap_or_else(|| "-".into());
            writeln!(f, "{:<4} {:>6} m² {:>5} m × {} m {:>8}", b.id, b.area_m2, b.width_m, b.depth_m, road)?;
        }
        writeln!(f)?;
        for s in &sv.spacings {
            writeln!(f, "{} -> {}: {} m", s.from, s.to, s.distance_m)?;
        }
        writeln!(f)?;
        writeln!(f, "orientation: {} ({})", sv.orientation, sv.orientation_notes)?;
        writeln!(
            f,
            "density:     {:.0}% ({} m² of {} m²)",
            sv.density_pct(),
            sv.built_area_m2(),
            sv.total_area_m2
        )?;
        for r in &sv.road_proximity {
            writeln!(f, "road:        {} at {} m ({})", r.id, r.distance_m, r.note)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_density_is_seventy_percent() {
        let sv = BuildingSurvey::sample();
        assert_eq!(sv.built_area_m2(), 140.0);
        assert!((sv.density_pct() - 70.0).abs() < 1e-4);
    }

    #[test]
    fn empty_total_area_has_zero_density() {
        let sv = BuildingSurvey { total_area_m2: 0.0, ..BuildingSurvey::sample() };
        assert_eq!(sv.density_pct(), 0.0);
    }

    #[test]
    fn report_renders_every_building() {
        let report = MappingReport {
            area_m2: 200.0,
            resolution: "10cm/pixel".into(),
            completed_unix_ms: 1_700_000_000_000,
            survey: BuildingSurvey::sample(),
        };
        let text = report.to_string();
        for id in ["B1", "B2", "B3", "B4", "B5"] {
            assert!(text.contains(id), "missing {id}");
        }
        assert!(text.contains("2023-11-14 22:13:20 UTC"));
        assert!(text.contains("density:     70%"));
        assert!(text.contains("Closest to the road"));
    }
}
