//! Component builder: folds one fragment group into point components.

use log::{debug, warn};

use crate::fragment::{FragmentMode, FragmentUnit, TimeFragment};
use crate::model::{AbsoluteTime, RelativeTime, TimePoint, WeekdayOffset};

/// The point components of one fragment group.
///
/// Each component is `None` when no fragment of that kind was present, as
/// opposed to present with every field empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Components {
    pub absolute: Option<AbsoluteTime>,
    pub relative: Option<RelativeTime>,
    pub weekday: Option<WeekdayOffset>,
    pub now: bool,
}

impl Components {
    pub fn into_point(self) -> TimePoint {
        TimePoint {
            absolute: self.absolute,
            relative: self.relative,
            weekday: self.weekday,
            now: self.now.then_some(true),
        }
    }
}

/// Fold a fragment group into absolute, relative and weekday components.
///
/// Repeated fields and repeated weekdays resolve last-one-wins. A fragment
/// with mode `now` marks the whole group as "now". A calendar-field fragment
/// without a mode contributes nothing, so a group made only of those is
/// rejected later as empty.
pub fn build_components(group: &[TimeFragment]) -> Components {
    let mut components = Components::default();

    for fragment in group {
        let field = match fragment.offset_unit {
            FragmentUnit::Weekday(weekday) => {
                if let Some(previous) = components.weekday {
                    debug!(
                        "weekday fragment overrides earlier {:?} {:+}",
                        previous.weekday, previous.offset
                    );
                }
                components.weekday = Some(WeekdayOffset {
                    weekday,
                    offset: fragment.offset_value,
                });
                continue;
            }
            FragmentUnit::Field(field) => field,
        };

        match fragment.mode {
            Some(FragmentMode::Absolute) => components
                .absolute
                .get_or_insert_with(AbsoluteTime::default)
                .set(field, fragment.offset_value),
            Some(FragmentMode::Relative) => components
                .relative
                .get_or_insert_with(RelativeTime::default)
                .set(field, fragment.offset_value),
            Some(FragmentMode::Now) => components.now = true,
            None => warn!(
                "ignoring '{}' fragment without a mode (expected absolute, relative or now)",
                fragment.offset_unit
            ),
        }
    }

    components
}

// ── Tests ───────────────────────────────────────────────────────────────────
