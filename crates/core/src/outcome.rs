/// Result of a best-effort step.
///
/// Advisory steps never abort the run. A warning carries the text the caller
/// must show the user before moving on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum StepOutcome {
	Ok,
	Warning(String),
}

impl StepOutcome {
	pub fn is_ok(&self) -> bool {
		matches!(self, StepOutcome::Ok)
	}

	pub fn warning(&self) -> Option<&str> {
		match self {
			StepOutcome::Ok => None,
			StepOutcome::Warning(msg) => Some(msg),
		}
	}
}
