use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::PlayerRecord;
use crate::metrics::Metric;

const FIRST_NAMES: &[&str] = &[
    "Lucas", "Hugo", "Nathan", "Théo", "Yanis", "Enzo", "Mathis", "Rayan", "Noah", "Adam",
    "Ilyes", "Moussa", "Kylian", "Sacha", "Malik", "Jules",
];

const LAST_NAMES: &[&str] = &[
    "Martin", "Bernard", "Diallo", "Moreau", "Traoré", "Lefebvre", "Camara", "Girard",
    "Fofana", "Mercier", "Koné", "Roux", "Sylla", "Blanc", "Cissé", "Faure",
];

const POSITIONS: &[&str] = &[
    "Centre Forward",
    "Left Wing",
    "Right Wing",
    "Centre Attacking Midfielder",
    "Left Centre Midfielder",
    "Right Defensive Midfielder",
    "Left Back",
    "Right Centre Back",
    "Goalkeeper",
];

const COMPETITIONS: &[(&str, &[&str])] = &[
    ("National 1", &["Versailles", "Rouen", "Nancy", "Orléans", "Dijon"]),
    ("Ligue 2", &["Amiens", "Caen", "Grenoble", "Laval", "Bastia"]),
    ("Ligue 1", &["Reims", "Brest", "Lorient", "Metz"]),
];

// (metric, mean, spread) for a plausible outfield player.
const METRIC_SHAPES: &[(Metric, f64, f64)] = &[
    (Metric::NpXgPerShot, 0.10, 0.05),
    (Metric::NpXg90, 0.20, 0.15),
    (Metric::NpShots90, 1.6, 1.0),
    (Metric::Npg90, 0.18, 0.15),
    (Metric::ShotOnTargetRatio, 0.35, 0.12),
    (Metric::Xa90, 0.12, 0.08),
    (Metric::OpKeyPasses90, 0.9, 0.5),
    (Metric::PassingRatio, 0.78, 0.08),
    (Metric::OpPassesIntoBox90, 1.1, 0.7),
    (Metric::Dribbles90, 1.0, 0.8),
    (Metric::DribbleRatio, 0.55, 0.15),
    (Metric::Turnovers90, 1.2, 0.6),
    (Metric::Dispossessions90, 1.0, 0.5),
    (Metric::DeepProgressions90, 3.5, 1.8),
    (Metric::Carries90, 25.0, 9.0),
    (Metric::PadjTackles90, 1.8, 0.9),
    (Metric::PadjInterceptions90, 1.5, 0.8),
    (Metric::Pressures90, 16.0, 5.0),
    (Metric::Counterpressures90, 4.0, 1.8),
    (Metric::AerialWins90, 1.4, 1.0),
    (Metric::AerialRatio, 0.48, 0.14),
    (Metric::DribbledPast90, 0.8, 0.4),
    (Metric::Errors90, 0.05, 0.04),
];

/// Deterministic synthetic season rows, for running without provider credentials.
pub fn demo_population(players: usize, seed: u64) -> Vec<PlayerRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..players)
        .map(|idx| {
            let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
            let last = LAST_NAMES[idx % LAST_NAMES.len()];
            let (competition, teams) = COMPETITIONS[rng.gen_range(0..COMPETITIONS.len())];
            let mut record = PlayerRecord::new(format!("{first} {last} {}", idx / LAST_NAMES.len() + 1));
            record.primary_position = Some(POSITIONS[rng.gen_range(0..POSITIONS.len())].to_string());
            record.team = Some(teams[rng.gen_range(0..teams.len())].to_string());
            record.competition = Some(competition.to_string());
            record.season = Some("2024/2025".to_string());
            record.age = Some(rng.gen_range(17..36));
            record.height = Some(rng.gen_range(168.0..196.0_f64).round());
            record.minutes = Some(rng.gen_range(90.0..3200.0_f64).round());

            for (metric, mean, spread) in METRIC_SHAPES {
                // Roughly one value in twenty is left blank, like thin provider coverage.
                if rng.gen_bool(0.05) {
                    continue;
                }
                let noise: f64 = (0..3).map(|_| rng.gen_range(-1.0..1.0_f64)).sum::<f64>() / 3.0;
                let value = (mean + noise * spread * 1.7).max(0.0);
                record.stats.insert(*metric, (value * 1000.0).round() / 1000.0);
            }
            record
        })
        .collect()
}
