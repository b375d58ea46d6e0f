use vigil_common::{GeoCoord, Locatable, Report};

pub const DEFAULT_CLUSTER_RADIUS_M: f64 = 500.0;

/// Group reports by proximity to a seed.
///
/// Walk the input in order. Each unprocessed report seeds a new cluster and
/// absorbs every later unprocessed report within `threshold_m` of the seed.
/// Absorbed members do not pull in further neighbours, so a chain
/// `a - b - c` with only `a - b` and `b - c` inside the threshold can split.
///
/// The output partitions the input: every report lands in exactly one
/// cluster, and singletons are kept. Position is used for bookkeeping, so
/// two reports sharing an id are still treated as distinct.
pub fn cluster_reports(reports: &[Report], threshold_m: f64) -> Vec<Vec<Report>> {
    let mut processed = vec![false; reports.len()];
    let mut clusters = Vec::new();

    for (i, seed) in reports.iter().enumerate() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let seed_coord: GeoCoord = seed.coord();
        let mut cluster = vec![seed.clone()];

        for (j, other) in reports.iter().enumerate().skip(i + 1) {
            if processed[j] {
                continue;
            }
            if seed_coord.distance_to(&other.coord()) <= threshold_m {
                processed[j] = true;
                cluster.push(other.clone());
            }
        }

        clusters.push(cluster);
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report(id: &str, lat: f64, lng: f64) -> Report {
        Report {
            id: id.into(),
            latitude: lat,
            longitude: lng,
            category: "flood".into(),
            tags: vec![],
            severity_level: 3,
            timestamp: Utc::now(),
            description: format!("report {id}"),
            ai_summary: None,
            credibility_score: 0.7,
            status: "active".into(),
        }
    }

    fn ids(clusters: &[Vec<Report>]) -> Vec<Vec<&str>> {
        clusters
            .iter()
            .map(|c| c.iter().map(|r| r.id.as_str()).collect())
            .collect()
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        assert!(cluster_reports(&[], 500.0).is_empty());
    }

    #[test]
    fn kingston_reports_split_into_pair_and_singleton() {
        let reports = vec![
            report("r1", 18.0, -76.8),
            report("r2", 18.0001, -76.8001),
            report("r3", 18.05, -76.85),
        ];

        let clusters = cluster_reports(&reports, DEFAULT_CLUSTER_RADIUS_M);
        assert_eq!(ids(&clusters), vec![vec!["r1", "r2"], vec!["r3"]]);
    }

    #[test]
    fn absorption_does_not_re_expand_from_members() {
        // ~0.0040° of latitude is ~445 m: a-b and b-c are inside 500 m, a-c is not.
        let reports = vec![
            report("a", 18.0, -76.8),
            report("b", 18.004, -76.8),
            report("c", 18.008, -76.8),
        ];

        let clusters = cluster_reports(&reports, 500.0);
        assert_eq!(ids(&clusters), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn result_partitions_input() {
        let reports: Vec<Report> = (0..25)
            .map(|i| {
                let lat = 18.0 + (i % 5) as f64 * 0.003;
                let lng = -76.8 + (i / 5) as f64 * 0.003;
                report(&format!("r{i}"), lat, lng)
            })
            .collect();

        let clusters = cluster_reports(&reports, 500.0);
        let total: usize = clusters.iter().map(Vec::len).sum();
        assert_eq!(total, reports.len());
        assert!(clusters.iter().all(|c| !c.is_empty()));

        let mut seen: Vec<&str> = clusters.iter().flatten().map(|r| r.id.as_str()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), reports.len());
    }

    #[test]
    fn members_are_within_threshold_of_their_seed() {
        let reports: Vec<Report> = (0..12)
            .map(|i| report(&format!("r{i}"), 18.0 + i as f64 * 0.002, -76.8))
            .collect();

        for cluster in cluster_reports(&reports, 500.0) {
            let seed = cluster[0].coord();
            for member in &cluster[1..] {
                assert!(seed.distance_to(&member.coord()) <= 500.0);
            }
        }
    }

    #[test]
    fn duplicate_ids_are_not_collapsed() {
        let reports = vec![report("dup", 18.0, -76.8), report("dup", 18.3, -76.8)];
        let clusters = cluster_reports(&reports, 500.0);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn singletons_survive() {
        let clusters = cluster_reports(&[report("solo", 18.0, -76.8)], 500.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 1);
    }
}
