/*! Narration jobs: what a controller asks the output channels to do. */

use serde::Serialize;
use ts_rs::TS;

/// Option flags for a job, or for one speech payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct JobOptions {
  /// Interrupt whatever is currently being spoken.
  pub interrupt: bool,
  /// Speak punctuation.
  pub punctuation: bool,
}

impl JobOptions {
  /// Queue behind current speech.
  pub const NONE: Self = Self {
    interrupt: false,
    punctuation: false,
  };

  /// Cut off current speech.
  pub const INTERRUPT: Self = Self {
    interrupt: true,
    punctuation: false,
  };
}

impl std::fmt::Display for JobOptions {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut flags = Vec::new();
    if self.interrupt {
      flags.push("interrupt");
    }
    if self.punctuation {
      flags.push("punctuation");
    }
    write!(f, "[{}]", flags.join(", "))
  }
}

/// One step of a job.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum Payload {
  /// Pause speech, keeping the utterance.
  PauseSpeech,
  /// Resume paused speech.
  ContinueSpeech,
  /// Drop whatever is being spoken.
  CancelSpeech,
  /// Speak `text`, with `options` overriding the job's.
  Speech {
    /// Text to speak.
    text: String,
    /// Per-payload flags.
    options: Option<JobOptions>,
  },
  /// Play sounds: `counts[i]` repetitions of `names[i]`, `cadence[i]` seconds apart.
  Sound {
    /// Sound names.
    names: Vec<String>,
    /// Repetitions per sound.
    counts: Vec<u32>,
    /// Seconds between repetitions, per sound.
    cadence: Vec<f64>,
  },
}

impl Payload {
  /// Speech payload without per-payload options.
  pub fn speech(text: impl Into<String>) -> Self {
    Self::Speech {
      text: text.into(),
      options: None,
    }
  }
}

impl std::fmt::Display for Payload {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::PauseSpeech => f.write_str("Pause"),
      Self::ContinueSpeech => f.write_str("Continue"),
      Self::CancelSpeech => f.write_str("Cancel"),
      Self::Speech { text, options } => match options {
        Some(options) => write!(f, "Speech: {text}, Options: {options}"),
        None => write!(f, "Speech: {text}"),
      },
      Self::Sound {
        names,
        counts,
        cadence,
      } => write!(f, "Sound: {names:?}, Count: {counts:?}, Cadence: {cadence:?}"),
    }
  }
}

/// Immutable narration request.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Job {
  /// Flags for the whole job.
  pub options: JobOptions,
  /// Who asked: a controller kind or a notification name.
  pub identifier: String,
  /// Steps, performed in order.
  pub payloads: Vec<Payload>,
}

impl Job {
  /// Job from explicit parts.
  pub fn new(options: JobOptions, identifier: impl Into<String>, payloads: Vec<Payload>) -> Self {
    Self {
      options,
      identifier: identifier.into(),
      payloads,
    }
  }

  /// Interrupting job for a newly focused element: cancel, then speak.
  pub fn focus(identifier: impl Into<String>, text: impl Into<String>) -> Self {
    Self::new(
      JobOptions::INTERRUPT,
      identifier,
      vec![Payload::CancelSpeech, Payload::speech(text)],
    )
  }

  /// Queued job for a change on an already focused element.
  pub fn announcement(identifier: impl Into<String>, text: impl Into<String>) -> Self {
    Self::new(JobOptions::NONE, identifier, vec![Payload::speech(text)])
  }

  /// Concatenated text of every speech payload.
  pub fn spoken_text(&self) -> String {
    self
      .payloads
      .iter()
      .filter_map(|p| match p {
        Payload::Speech { text, .. } => Some(text.as_str()),
        Payload::PauseSpeech
        | Payload::ContinueSpeech
        | Payload::CancelSpeech
        | Payload::Sound { .. } => None,
      })
      .collect::<Vec<_>>()
      .join(" ")
  }
}

impl std::fmt::Display for Job {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let payloads = self
      .payloads
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join(", ");
    write!(
      f,
      "Identifier: {}, Options: {}, Payloads: [{payloads}]",
      self.identifier, self.options
    )
  }
}
