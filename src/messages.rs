//! Bilingual user-facing messages
//!
//! Every result the pipeline shows is a [`Message`] rendered in the session
//! language. Messages are short and actionable and never contain raw error
//! text, with one exception: a collaborator's rejection message is passed
//! through verbatim.

use crate::locale::Locale;
use crate::tasks::Priority;

/// Most task titles named in a listing
pub const MAX_LISTED_TITLES: usize = 5;

/// Which tasks a filtered listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    Completed,
    Pending,
}

/// A user-facing message, independent of language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Created { title: String },
    Completed { title: String },
    Reopened { title: String },
    Deleted { title: String },
    PrioritySet { title: String, priority: Priority },
    AlreadyCompleted { title: String },
    AlreadyPending { title: String },
    AlreadyPriority { title: String, priority: Priority },
    NotFound { fragment: String, suggestions: Vec<String> },
    Ambiguous { fragment: String, candidates: Vec<String> },
    EmptyTitle,
    TitleTooLong { max: usize },
    /// `titles` holds at most [`MAX_LISTED_TITLES`] of `total`
    TaskList { total: usize, titles: Vec<String> },
    Filtered {
        filter: TaskFilter,
        fragment: String,
        total: usize,
        titles: Vec<String>,
    },
    SearchResults { query: String, titles: Vec<String> },
    /// Collaborator rejection, shown as given
    MutationRejected { reason: String },
    MutationFailed,
    UpdateInProgress { title: String },
    SnapshotUnavailable,
    Busy,
    Help,
    VoiceUnsupported,
    MicrophoneDenied,
    NoSpeech,
    NetworkError,
    RecognitionFailed,
}

impl Message {
    /// Render in `locale`
    pub fn render(&self, locale: Locale) -> String {
        match locale {
            Locale::English => self.render_english(),
            Locale::Urdu => self.render_urdu(),
        }
    }

    fn render_english(&self) -> String {
        match self {
            Message::Created { title } => format!("Created: {}", title),
            Message::Completed { title } => format!("Completed: {}", title),
            Message::Reopened { title } => format!("Marked as not done: {}", title),
            Message::Deleted { title } => format!("Deleted: {}", title),
            Message::PrioritySet { title, priority } => match priority {
                Priority::High => format!("Marked as high priority: {}", title),
                Priority::Normal => format!("Marked as normal priority: {}", title),
            },
            Message::AlreadyCompleted { title } => format!("Already completed: {}", title),
            Message::AlreadyPending { title } => format!("Already not done: {}", title),
            Message::AlreadyPriority { title, priority } => match priority {
                Priority::High => format!("Already high priority: {}", title),
                Priority::Normal => format!("Already normal priority: {}", title),
            },
            Message::NotFound {
                fragment,
                suggestions,
            } => {
                let mut message = format!("No task matching \"{}\".", fragment);
                if !suggestions.is_empty() {
                    message.push_str(&format!(" Did you mean: {}?", join(suggestions, ", ")));
                }
                message
            }
            Message::Ambiguous {
                fragment,
                candidates,
            } => format!(
                "Several tasks match \"{}\": {}. Please say the full title.",
                fragment,
                join(candidates, ", ")
            ),
            Message::EmptyTitle => "Please say a title for the task.".to_string(),
            Message::TitleTooLong { max } => {
                format!("Task titles can be at most {} characters.", max)
            }
            Message::TaskList { total, titles } => match total {
                0 => "You have no tasks.".to_string(),
                1 => format!("You have 1 task: {}", join(titles, ", ")),
                n => format!(
                    "You have {} tasks: {}{}",
                    n,
                    join(titles, ", "),
                    more_english(*n, titles.len())
                ),
            },
            Message::Filtered {
                filter,
                fragment,
                total,
                titles,
            } => {
                let (label, heading) = match filter {
                    TaskFilter::Completed => ("completed", "Completed"),
                    TaskFilter::Pending => ("pending", "Pending"),
                };
                let matching = if fragment.is_empty() {
                    String::new()
                } else {
                    format!(" matching \"{}\"", fragment)
                };
                if *total == 0 {
                    format!("No {} tasks{}.", label, matching)
                } else {
                    format!(
                        "{} tasks{} ({}): {}{}",
                        heading,
                        matching,
                        total,
                        join(titles, ", "),
                        more_english(*total, titles.len())
                    )
                }
            }
            Message::SearchResults { query, titles } => {
                if titles.is_empty() {
                    format!("No tasks found for \"{}\".", query)
                } else {
                    format!("Found for \"{}\": {}", query, join(titles, ", "))
                }
            }
            Message::MutationRejected { reason } => reason.clone(),
            Message::MutationFailed => {
                "Couldn't update the task. Please try again.".to_string()
            }
            Message::UpdateInProgress { title } => {
                format!("\"{}\" is already being updated. Please wait.", title)
            }
            Message::SnapshotUnavailable => {
                "Couldn't load your tasks. Please try again.".to_string()
            }
            Message::Busy => "Still processing the previous command. Please wait.".to_string(),
            Message::Help => "Sorry, I didn't understand. Try \"Add todo: buy milk\", \
                              \"Complete: buy milk\" or \"Show my tasks\"."
                .to_string(),
            Message::VoiceUnsupported => {
                "Voice input isn't available here. Please type your command instead.".to_string()
            }
            Message::MicrophoneDenied => {
                "Microphone access was denied. Allow it and try again.".to_string()
            }
            Message::NoSpeech => "I didn't hear anything. Please try again.".to_string(),
            Message::NetworkError => {
                "Speech recognition lost its connection. Please try again.".to_string()
            }
            Message::RecognitionFailed => {
                "Speech recognition failed. Please try again.".to_string()
            }
        }
    }

    fn render_urdu(&self) -> String {
        match self {
            Message::Created { title } => format!("نیا کام بنا دیا گیا: {}", title),
            Message::Completed { title } => format!("مکمل کر دیا گیا: {}", title),
            Message::Reopened { title } => format!("دوبارہ کھول دیا گیا: {}", title),
            Message::Deleted { title } => format!("حذف کر دیا گیا: {}", title),
            Message::PrioritySet { title, priority } => match priority {
                Priority::High => format!("اعلی ترجیح دے دی گئی: {}", title),
                Priority::Normal => format!("عام ترجیح کر دی گئی: {}", title),
            },
            Message::AlreadyCompleted { title } => format!("پہلے ہی مکمل ہے: {}", title),
            Message::AlreadyPending { title } => format!("پہلے ہی نامکمل ہے: {}", title),
            Message::AlreadyPriority { title, priority } => match priority {
                Priority::High => format!("پہلے ہی اعلی ترجیح پر ہے: {}", title),
                Priority::Normal => format!("پہلے ہی عام ترجیح پر ہے: {}", title),
            },
            Message::NotFound {
                fragment,
                suggestions,
            } => {
                let mut message = format!("\"{}\" سے ملتا کوئی کام نہیں ملا۔", fragment);
                if !suggestions.is_empty() {
                    message.push_str(&format!(
                        " کیا آپ کا مطلب تھا: {}؟",
                        join(suggestions, "، ")
                    ));
                }
                message
            }
            Message::Ambiguous {
                fragment,
                candidates,
            } => format!(
                "\"{}\" سے کئی کام ملتے ہیں: {}۔ براہ کرم پورا نام بتائیں۔",
                fragment,
                join(candidates, "، ")
            ),
            Message::EmptyTitle => "براہ کرم کام کا نام بتائیں۔".to_string(),
            Message::TitleTooLong { max } => {
                format!("کام کا نام زیادہ سے زیادہ {} حروف کا ہو سکتا ہے۔", max)
            }
            Message::TaskList { total, titles } => match total {
                0 => "آپ کے پاس کوئی کام نہیں ہے۔".to_string(),
                n => format!(
                    "آپ کے {} کام ہیں: {}{}",
                    n,
                    join(titles, "، "),
                    more_urdu(*n, titles.len())
                ),
            },
            Message::Filtered {
                filter,
                fragment,
                total,
                titles,
            } => {
                let label = match filter {
                    TaskFilter::Completed => "مکمل",
                    TaskFilter::Pending => "باقی",
                };
                let matching = if fragment.is_empty() {
                    String::new()
                } else {
                    format!(" (\"{}\")", fragment)
                };
                if *total == 0 {
                    format!("کوئی {} کام نہیں{}۔", label, matching)
                } else {
                    format!(
                        "{} {} کام{}: {}{}",
                        total,
                        label,
                        matching,
                        join(titles, "، "),
                        more_urdu(*total, titles.len())
                    )
                }
            }
            Message::SearchResults { query, titles } => {
                if titles.is_empty() {
                    format!("\"{}\" کے لیے کوئی کام نہیں ملا۔", query)
                } else {
                    format!("\"{}\" کے نتائج: {}", query, join(titles, "، "))
                }
            }
            Message::MutationRejected { reason } => reason.clone(),
            Message::MutationFailed => {
                "کام اپ ڈیٹ نہیں ہو سکا، دوبارہ کوشش کریں۔".to_string()
            }
            Message::UpdateInProgress { title } => {
                format!("\"{}\" پر پہلے ہی کام جاری ہے، انتظار کریں۔", title)
            }
            Message::SnapshotUnavailable => {
                "آپ کے کام لوڈ نہیں ہو سکے، دوبارہ کوشش کریں۔".to_string()
            }
            Message::Busy => "پچھلی کمانڈ پر کام جاری ہے، براہ کرم انتظار کریں۔".to_string(),
            Message::Help => "معاف کیجیے، بات سمجھ نہیں آئی۔ کہیں \"نیا کام: دودھ خریدیں\" \
                              یا \"دودھ خریدیں مکمل کریں\"۔"
                .to_string(),
            Message::VoiceUnsupported => {
                "یہاں آواز سے کمانڈ دستیاب نہیں، براہ کرم ٹائپ کریں۔".to_string()
            }
            Message::MicrophoneDenied => {
                "مائیکروفون کی اجازت نہیں ملی۔ اجازت دے کر دوبارہ کوشش کریں۔".to_string()
            }
            Message::NoSpeech => "کچھ سنائی نہیں دیا، دوبارہ کوشش کریں۔".to_string(),
            Message::NetworkError => {
                "آواز پہچاننے میں نیٹ ورک کا مسئلہ ہوا، دوبارہ کوشش کریں۔".to_string()
            }
            Message::RecognitionFailed => {
                "آواز پہچاننے میں مسئلہ ہوا، دوبارہ کوشش کریں۔".to_string()
            }
        }
    }
}

fn join(items: &[String], separator: &str) -> String {
    items.join(separator)
}

fn more_english(total: usize, named: usize) -> String {
    if total > named {
        format!(" and {} more", total - named)
    } else {
        String::new()
    }
}

fn more_urdu(total: usize, named: usize) -> String {
    if total > named {
        format!(" اور {} مزید", total - named)
    } else {
        String::new()
    }
}
