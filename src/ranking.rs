use super::area::Area;
use super::dates::Day;


pub const TOP: usize = 15;
pub const WEEK: Day = 7;


/// Areas sorted by descending `metric`, keeping input order among equals.
pub fn rank_by<'a, I, F>(areas: I, metric: F) -> Vec<&'a Area>
where I: IntoIterator<Item = &'a Area>, F: Fn(&Area) -> f64 {
    let mut scored: Vec<(f64,&Area)> = areas.into_iter().map(|area| (metric(area), area)).collect();
    scored.sort_by(|a,b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_,area)| area).collect()
}

/// The `n` highest 7-day rates ending at `day`.
pub fn top_by_rate<'a, I>(areas: I, day: Day, n: usize) -> Vec<&'a Area>
where I: IntoIterator<Item = &'a Area> {
    let mut ranked = rank_by(areas, |area| area.rate_over_interval(day, WEEK));
    ranked.truncate(n);
    ranked
}

/// Like `top_by_rate`, but each area is judged at its own latest day.
pub fn top_by_latest_rate<'a, I>(areas: I, n: usize) -> Vec<&'a Area>
where I: IntoIterator<Item = &'a Area> {
    let mut ranked = rank_by(areas, |area| area.last_day()
			     .map_or(0.0, |day| area.rate_over_interval(day, WEEK)));
    ranked.truncate(n);
    ranked
}

pub fn top_by_vaccination<'a, I>(areas: I, n: usize) -> Vec<&'a Area>
where I: IntoIterator<Item = &'a Area> {
    let mut ranked = rank_by(areas, Area::vaccination_share);
    ranked.truncate(n);
    ranked
}


/// 7-day rate a place has to exceed to raise an alert.
pub fn alert_threshold(bellwether: &Area, day: Day, multiplier: f64) -> f64 {
    bellwether.rate_over_interval(day, WEEK) * multiplier
}

/// Every area whose 7-day rate is strictly above `threshold`, in input order.
pub fn above_threshold<'a, I>(areas: I, day: Day, threshold: f64) -> Vec<&'a Area>
where I: IntoIterator<Item = &'a Area> {
    areas.into_iter().filter(|area| area.rate_over_interval(day, WEEK) > threshold).collect()
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::area::AreaBuilder;

    fn area(id: &str, population: f64, cases: &[u64]) -> Area {
	let mut builder = AreaBuilder::new(id, id, population).unwrap();
	for (day,count) in cases.iter().enumerate() {
	    builder.record_case(day as Day, *count);
	}
	builder.freeze()
    }

    fn ids(areas: &[&Area]) -> Vec<String> {
	areas.iter().map(|a| a.id().to_string()).collect()
    }

    #[test]
    fn ties_keep_input_order() {
	let areas = vec![
	    area("a", 1000.0, &[1]),
	    area("b", 1000.0, &[5]),
	    area("c", 2000.0, &[2]),
	    area("d", 1000.0, &[5]),
	    area("e", 1000.0, &[1]),
	];
	assert_eq!(ids(&top_by_rate(&areas, 0, 15)), vec!["b", "d", "a", "c", "e"]);
	assert_eq!(ids(&top_by_rate(&areas, 0, 2)), vec!["b", "d"]);
	// same input, same answer
	assert_eq!(top_by_rate(&areas, 0, 15), top_by_rate(&areas, 0, 15));
    }

    #[test]
    fn rate_ranking_looks_at_the_trailing_week_only() {
	let areas = vec![
	    area("old", 1000.0, &[500, 0, 0, 0, 0, 0, 0, 0, 1]),
	    area("new", 1000.0, &[0, 0, 0, 0, 0, 0, 0, 0, 9]),
	];
	assert_eq!(ids(&top_by_rate(&areas, 8, 15)), vec!["new", "old"]);
	assert_eq!(ids(&top_by_rate(&areas, 6, 15)), vec!["old", "new"]);
    }

    #[test]
    fn latest_rate_uses_each_areas_own_last_day() {
	let areas = vec![
	    area("stale", 1000.0, &[50, 50]),
	    area("fresh", 1000.0, &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 60]),
	    area("silent", 1000.0, &[]),
	];
	assert_eq!(ids(&top_by_latest_rate(&areas, 15)), vec!["stale", "fresh", "silent"]);
    }

    #[test]
    fn alert_threshold_is_a_multiple_of_the_bellwether() {
	let nation = area("E92000001", 100000.0, &[10; 7]);
	let areas = vec![
	    area("hot", 1000.0, &[1, 0, 0, 0, 0, 0, 0]),
	    area("warm", 1000.0, &[0, 0, 0, 0, 0, 0, 0]),
	    area("boiling", 1000.0, &[1, 1, 1, 1, 1, 1, 1]),
	];
	let threshold = alert_threshold(&nation, 6, 4.0);
	assert!((threshold - 280.0).abs() < 1e-9);
	assert_eq!(ids(&above_threshold(&areas, 6, threshold)), vec!["boiling"]);
    }

    #[test]
    fn vaccination_share_ranking() {
	let mut small = AreaBuilder::new("small", "small", 1000.0).unwrap();
	small.record_vaccination(3, 500);
	let mut big = AreaBuilder::new("big", "big", 100000.0).unwrap();
	big.record_vaccination(4, 20000);
	let none = AreaBuilder::new("none", "none", 10.0).unwrap();
	let areas = vec![big.freeze(), none.freeze(), small.freeze()];
	assert_eq!(ids(&top_by_vaccination(&areas, 15)), vec!["small", "big", "none"]);
	assert_eq!(ids(&top_by_vaccination(&areas, 1)), vec!["small"]);
    }

}
