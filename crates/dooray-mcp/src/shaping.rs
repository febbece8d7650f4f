// Client side shaping of decoded list results
//
// - recency filtering on an entity timestamp
// - projection of full entities onto reduced views
//
// Both are pure over their inputs; the recency filter only logs.

use chrono::{Local, Months, NaiveDateTime};
use tracing::{debug, warn};

use crate::types::{Channel, Post, PostSummary, SimpleChannel};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// An entity carrying a local date-time string usable for recency filtering
pub trait Timestamped {
	/// Identifier used in log lines when the timestamp cannot be used
	fn entity_id(&self) -> &str;

	fn timestamp(&self) -> Option<&str>;
}

/// A full view that can be reduced to a smaller one
pub trait Project {
	type Reduced;

	fn project(&self) -> Self::Reduced;
}

/// Keep the entities updated within the last `months` months of local time.
pub fn filter_recent<E: Timestamped>(entities: Vec<E>, months: u32) -> Vec<E> {
	filter_recent_at(entities, months, Local::now().naive_local())
}

/// Keep the entities whose timestamp is strictly after `now - months`.
///
/// Entities with an absent or unparsable timestamp are dropped with a warning.
/// Months are calendar months; a day that does not exist in the target month is
/// clamped to that month's last day.
pub fn filter_recent_at<E: Timestamped>(entities: Vec<E>, months: u32, now: NaiveDateTime) -> Vec<E> {
	let cutoff = now
		.checked_sub_months(Months::new(months))
		.unwrap_or(NaiveDateTime::MIN);
	let before = entities.len();

	let kept: Vec<E> = entities
		.into_iter()
		.filter(|entity| match entity.timestamp().and_then(parse_local_timestamp) {
			Some(ts) => ts > cutoff,
			None => {
				warn!(
					target: "dooray::shaping",
					id = %entity.entity_id(),
					timestamp = ?entity.timestamp(),
					"excluding entity with unusable timestamp"
				);
				false
			},
		})
		.collect();

	debug!(
		target: "dooray::shaping",
		months,
		%cutoff,
		before,
		after = kept.len(),
		"applied recency filter"
	);
	kept
}

/// Parse `YYYY-MM-DDTHH:MM:SS`, ignoring fractional seconds and a trailing
/// UTC offset (`Z`, `+09:00`). The wall clock value is taken as is.
pub fn parse_local_timestamp(raw: &str) -> Option<NaiveDateTime> {
	let trimmed = strip_offset(raw.trim());
	let whole_seconds = match trimmed.split_once('.') {
		Some((head, _)) => head,
		None => trimmed,
	};
	NaiveDateTime::parse_from_str(whole_seconds, TIMESTAMP_FORMAT).ok()
}

fn strip_offset(s: &str) -> &str {
	if let Some(rest) = s.strip_suffix(['Z', 'z']) {
		return rest;
	}
	let Some(split) = s.len().checked_sub(6) else {
		return s;
	};
	match (s.get(..split), s.get(split..)) {
		(Some(head), Some(tail)) if is_offset(tail.as_bytes()) => head,
		_ => s,
	}
}

fn is_offset(b: &[u8]) -> bool {
	matches!(b, [sign, h1, h2, b':', m1, m2]
		if (*sign == b'+' || *sign == b'-')
			&& [h1, h2, m1, m2].iter().all(|c| c.is_ascii_digit()))
}

/// Project every entity in order.
pub fn project_all<E: Project>(entities: &[E]) -> Vec<E::Reduced> {
	entities.iter().map(Project::project).collect()
}

impl Timestamped for Channel {
	fn entity_id(&self) -> &str {
		&self.id
	}

	fn timestamp(&self) -> Option<&str> {
		self.updated_at.as_deref()
	}
}

impl Project for Channel {
	type Reduced = SimpleChannel;

	fn project(&self) -> SimpleChannel {
		SimpleChannel {
			id: self.id.clone(),
			title: self.title.clone(),
			kind: self.kind.clone(),
			status: self.status.clone(),
			updated_at: self.updated_at.clone(),
			participant_count: self.users.as_ref().map(|u| u.participants.len()),
		}
	}
}

impl Timestamped for Post {
	fn entity_id(&self) -> &str {
		&self.id
	}

	fn timestamp(&self) -> Option<&str> {
		self.updated_at.as_deref()
	}
}

impl Project for Post {
	type Reduced = PostSummary;

	fn project(&self) -> PostSummary {
		PostSummary {
			id: self.id.clone(),
			subject: self.subject.clone(),
			task_number: self.task_number.clone(),
			workflow_class: self.workflow_class.clone(),
			workflow: self.workflow.clone(),
			assignees: self
				.users
				.to
				.iter()
				.filter_map(|user| user.member.clone())
				.collect(),
			priority: self.priority.clone(),
			due_date: self.due_date.clone(),
			created_at: self.created_at.clone(),
			updated_at: self.updated_at.clone(),
		}
	}
}
