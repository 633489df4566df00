pub mod client;
pub mod domain;
pub mod markdown;
pub mod ports;
pub mod validate;

pub use domain::{
    ChordProgression, DrawingExercise, DrawingSubmission, FeedbackResult, GeneratedPrompt,
    GoogleIdentity, PromptEvent, SoundDesignBrief, SoundDesignExercise, SoundExerciseKind,
    StoredPrompt, UserProfile, WritingSubmission,
};
pub use ports::{
    ChordProgressionService, CounterStore, DrawingService, EventNotifier, IdentityVerifier,
    PortError, PortResult, PromptStore, SoundDesignService, WritingFeedbackService,
    WritingPromptService,
};
pub use validate::ValidationError;
