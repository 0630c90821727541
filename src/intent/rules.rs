//! Built-in rule tables
//!
//! Each table is an ordered list of (anchor pattern, intent, fragment rule)
//! entries. Patterns are matched against folded text (see `crate::text`) and
//! evaluated top to bottom; the first match wins, so more specific phrasings
//! sit above the generic ones they would otherwise be shadowed by.
//!
//! Placeholders in braces are expanded when a table is compiled:
//!
//! | placeholder | expands to |
//! |---|---|
//! | `{lead}` | English politeness prefix ("please", "can you", "ok") |
//! | `{lead_ur}` | Urdu / Roman Urdu politeness prefix |
//! | `{tail}` | optional delimiter (`:` `،` `,` `-` or a space) and the `title` capture |
//! | `{do}` / `{do_r}` | Urdu "do" verb forms (کریں, کرو, کر دیں...) / Roman Urdu (karo, karein...) |
//! | `{show}` / `{show_r}` | Urdu "show" verb forms (دکھائیں...) / Roman Urdu (dikhao...) |

use super::IntentKind::{self, *};
use serde::{Deserialize, Serialize};
use FragmentRule::{None as NoTitle, Optional, Required};

/// How a rule treats the text after its anchor phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentRule {
    /// The rule carries no title (`List`, bare filter questions)
    None,
    /// A non-empty title is required; a blank one classifies as `Unknown`
    Required,
    /// A title narrows the result but may be empty (filters)
    Optional,
}

/// One uncompiled rule
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub pattern: &'static str,
    pub intent: IntentKind,
    pub fragment: FragmentRule,
}

const fn rule(pattern: &'static str, intent: IntentKind, fragment: FragmentRule) -> RuleSpec {
    RuleSpec {
        pattern,
        intent,
        fragment,
    }
}

/// Placeholder expansions shared by every table
pub(crate) const PLACEHOLDERS: &[(&str, &str)] = &[
    (
        "{lead}",
        r"(?:(?:ok|okay|hey)[,\s]+)?(?:please\s+|(?:can|could|would)\s+you\s+(?:please\s+)?)?",
    ),
    ("{lead_ur}", r"(?:براہ\s+کرم\s+|برائے\s+مہربانی\s+|پلیز\s+|please\s+)?"),
    ("{tail}", r"(?:(?:\s*[:،,\-]\s*|\s+)(?P<title>.*))?"),
    (
        "{do}",
        r"(?:کریں|کرو|کیجیے|کیجئے|کر\s+دیں|کر\s+دو|کردیں|کردو)",
    ),
    (
        "{do_r}",
        r"(?:karo|karen|karein|kardo|kar\s+do|kar\s+dein|kar\s+dain|kijiye|kijie)",
    ),
    (
        "{show}",
        r"(?:دکھائیں|دکھاؤ|دکھاو|دکھا\s+دیں|دکھا\s+دو|بتائیں|بتاؤ)",
    ),
    (
        "{show_r}",
        r"(?:dikhao|dikhaen|dikhayen|dikhaiye|dikha\s+do|batao|bataen)",
    ),
];

/// English rules
pub const ENGLISH: &[RuleSpec] = &[
    // Priority changes come first: "mark as high priority" must not fall
    // through to the generic "mark" rule below.
    rule(
        r"^{lead}(?:mark|set|make|flag)(?:\s+it)?\s+(?:as\s+)?(?:high(?:\s+priority)?|top\s+priority|urgent|important){tail}$",
        SetHighPriority,
        Required,
    ),
    rule(
        r"^{lead}(?:mark|set|make|flag)\s+(?P<title>.+?)\s+(?:as\s+)?(?:high(?:\s+priority)?|top\s+priority|urgent|important)$",
        SetHighPriority,
        Required,
    ),
    rule(
        r"^{lead}(?:prioriti[sz]e|raise\s+(?:the\s+)?priority(?:\s+of)?){tail}$",
        SetHighPriority,
        Required,
    ),
    rule(
        r"^{lead}(?:mark|set|make)(?:\s+it)?\s+(?:as\s+)?(?:normal|low|regular)(?:\s+priority)?{tail}$",
        SetNormalPriority,
        Required,
    ),
    rule(
        r"^{lead}(?:mark|set|make)\s+(?P<title>.+?)\s+(?:as\s+)?(?:normal|low|regular)(?:\s+priority)?$",
        SetNormalPriority,
        Required,
    ),
    rule(
        r"^{lead}(?:deprioriti[sz]e|remove\s+(?:the\s+)?priority(?:\s+from)?|lower\s+(?:the\s+)?priority(?:\s+of)?){tail}$",
        SetNormalPriority,
        Required,
    ),
    // Reopening before completing: "mark as not done" contains "done"
    rule(
        r"^{lead}(?:mark|set)(?:\s+it)?\s+(?:as\s+)?(?:not\s+(?:done|completed?|finished)|incomplete|uncompleted?|undone|pending|open|active){tail}$",
        Uncomplete,
        Required,
    ),
    rule(
        r"^{lead}(?:mark|set)\s+(?P<title>.+?)\s+(?:as\s+)?(?:not\s+(?:done|completed?|finished)|incomplete|uncompleted?|undone|pending|open|active)$",
        Uncomplete,
        Required,
    ),
    rule(
        r"^{lead}(?:uncomplete|un-complete|reopen|re-open|undo|uncheck|un-check){tail}$",
        Uncomplete,
        Required,
    ),
    rule(
        r"^{lead}(?:mark|set)(?:\s+it)?\s+(?:as\s+)?(?:done|completed?|finished){tail}$",
        Complete,
        Required,
    ),
    rule(
        r"^{lead}(?:mark|set)\s+(?P<title>.+?)\s+(?:as\s+)?(?:done|completed?|finished)$",
        Complete,
        Required,
    ),
    rule(
        r"^{lead}(?:complete|finish|check\s+off|tick\s+off|done|close){tail}$",
        Complete,
        Required,
    ),
    rule(
        r"^{lead}(?:delete|remove|erase|drop|cancel|discard|get\s+rid\s+of)(?:\s+(?:the\s+)?(?:task|todo|to-do|item))?{tail}$",
        Delete,
        Required,
    ),
    // Filters before the plain listing: "show completed tasks" vs "show tasks"
    rule(
        r"^{lead}(?:show|list|display|view|read|what\s+are)(?:\s+(?:me|all|my|the))*\s+(?:completed|done|finished)(?:\s+(?:tasks?|todos?|to-dos?|items?))?{tail}$",
        FilterCompleted,
        Optional,
    ),
    rule(
        r"^what\s+have\s+i\s+(?:done|completed|finished)$",
        FilterCompleted,
        NoTitle,
    ),
    rule(
        r"^{lead}(?:show|list|display|view|read|what\s+are)(?:\s+(?:me|all|my|the))*\s+(?:pending|incomplete|open|remaining|active|unfinished|outstanding)(?:\s+(?:tasks?|todos?|to-dos?|items?))?{tail}$",
        FilterPending,
        Optional,
    ),
    rule(
        r"^what(?:'s|’s|\s+is)\s+left(?:\s+to\s+do)?$",
        FilterPending,
        NoTitle,
    ),
    rule(
        r"^{lead}(?:search|find|look\s+for|look\s+up)(?:\s+(?:tasks?|todos?))?(?:\s+(?:for|with|about|containing))?{tail}$",
        Search,
        Required,
    ),
    rule(
        r"^{lead}(?:show|list|display|view|read|get|what\s+are|tell\s+me)(?:\s+(?:me|all|my|the|of))*(?:\s+(?:tasks|todos|to-dos|items|list|to\s+do\s+list|todo\s+list|task\s+list))?$",
        List,
        NoTitle,
    ),
    rule(r"^(?:my\s+)?(?:tasks|todos|to-dos)$", List, NoTitle),
    rule(
        r"^what\s+do\s+i\s+(?:have|need)\s+to\s+do(?:\s+today)?$",
        List,
        NoTitle,
    ),
    // Creation sits below every other anchored family
    rule(
        r"^{lead}add\s+(?P<title>.+?)\s+to\s+(?:my|the)\s+(?:todo\s+|to-do\s+|task\s+)?list$",
        Create,
        Required,
    ),
    rule(
        r"^{lead}(?:add|create|new|make|insert)(?:\s+(?:a|an))?(?:\s+new)?(?:\s+(?:task|todo|to-do|item|reminder))?{tail}$",
        Create,
        Required,
    ),
    rule(r"^{lead}remind\s+me\s+to{tail}$", Create, Required),
    rule(
        r"^i\s+(?:need|have|want)\s+to(?:\s*[:,\-]\s*|\s+)(?P<title>.+)$",
        Create,
        Required,
    ),
    // No anchor at all, so it must not shadow "add todo: ... is done"
    rule(
        r"^(?P<title>.+?)\s+is\s+(?:done|completed?|finished)$",
        Complete,
        Required,
    ),
];

/// Urdu rules: Urdu script followed by Roman Urdu for each intent
///
/// Urdu is verb-final, so most intents have a suffix form
/// ("دودھ خریدیں مکمل کریں") next to the dictated prefix form
/// ("مکمل کریں: دودھ خریدیں").
pub const URDU: &[RuleSpec] = &[
    // Dictated Create prefixes ("نیا کام: ...") come first: the title
    // after them may itself end in a command verb
    rule(
        r"^{lead_ur}(?:نیا|نئی|نیی)\s+(?:کام|ٹاسک){tail}$",
        Create,
        Required,
    ),
    rule(
        r"^{lead_ur}(?:کام\s+)?(?:شامل|ایڈ|درج)(?:\s+{do})?{tail}$",
        Create,
        Required,
    ),
    rule(
        r"^{lead_ur}(?:مجھے\s+)?یاد\s+(?:دلائیں|دلاؤ|دلانا)(?:\s+کہ)?{tail}$",
        Create,
        Required,
    ),
    rule(
        r"^{lead_ur}(?:naya|nayi|new)\s+(?:kaam|task){tail}$",
        Create,
        Required,
    ),
    rule(
        r"^{lead_ur}(?:kaam\s+)?(?:add|shamil|darj)(?:\s+{do_r})?{tail}$",
        Create,
        Required,
    ),
    // High priority
    rule(
        r"^{lead_ur}(?:اہم|زیادہ\s+اہم|اعلی\s+ترجیح|زیادہ\s+ترجیح|ہائی\s+پرائرٹی|ہائی\s+پرایورٹی)(?:\s+(?:بنائیں|بناؤ|{do}))?{tail}$",
        SetHighPriority,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:کو\s+)?(?:اہم|زیادہ\s+اہم|اعلی\s+ترجیح|زیادہ\s+ترجیح|ہائی\s+پرائرٹی)(?:\s+(?:والا|والی))?\s+(?:بنائیں|بناؤ|بنا\s+دیں|بنا\s+دو|{do})$",
        SetHighPriority,
        Required,
    ),
    rule(
        r"^{lead_ur}(?:high\s+priority|ahem|aham|zaroori|important)(?:\s+(?:banao|banaen|banayen|{do_r}))?{tail}$",
        SetHighPriority,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:ko\s+)?(?:high\s+priority|ahem|aham|zaroori|important)\s+(?:banao|banaen|banayen|bana\s+do|{do_r})$",
        SetHighPriority,
        Required,
    ),
    // Normal priority
    rule(
        r"^{lead_ur}(?:عام|نارمل|معمولی)(?:\s+ترجیح)?(?:\s+(?:بنائیں|بناؤ|{do}))?{tail}$",
        SetNormalPriority,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:کو\s+)?(?:عام|نارمل|معمولی)(?:\s+ترجیح)?(?:\s+(?:والا|والی))?\s+(?:بنائیں|بناؤ|بنا\s+دیں|بنا\s+دو|{do})$",
        SetNormalPriority,
        Required,
    ),
    rule(
        r"^{lead_ur}(?:normal|aam|mamooli)(?:\s+priority)?(?:\s+(?:banao|banaen|banayen|{do_r}))?{tail}$",
        SetNormalPriority,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:ko\s+)?(?:normal|aam|mamooli)(?:\s+priority)?\s+(?:banao|banaen|banayen|bana\s+do|{do_r})$",
        SetNormalPriority,
        Required,
    ),
    // Filters sit above Complete so "مکمل کام دکھائیں" is not read as a command
    rule(
        r"^{lead_ur}(?:(?:تمام|سارے|میرے)\s+)*(?:مکمل|مکمل\s+شدہ|ختم\s+شدہ|ہو\s+چکے)\s+(?:کام|ٹاسک)(?:\s+{show})?{tail}$",
        FilterCompleted,
        Optional,
    ),
    rule(
        r"^{lead_ur}(?:(?:sab|saare|sare|mere|meray)\s+)*(?:mukammal|complete|completed|khatam\s+shuda|done)\s+(?:kaam|tasks?)(?:\s+{show_r})?{tail}$",
        FilterCompleted,
        Optional,
    ),
    rule(
        r"^{lead_ur}(?:(?:تمام|سارے|میرے)\s+)*(?:باقی|نامکمل|زیر\s+التوا|بقایا)\s+(?:کام|ٹاسک)(?:\s+{show})?{tail}$",
        FilterPending,
        Optional,
    ),
    rule(
        r"^{lead_ur}(?:(?:sab|saare|sare|mere|meray)\s+)*(?:baqi|baaki|baki|namukammal|pending|incomplete)\s+(?:kaam|tasks?)(?:\s+{show_r})?{tail}$",
        FilterPending,
        Optional,
    ),
    // Reopen sits above Complete: "نامکمل" contains "مکمل"
    rule(
        r"^{lead_ur}(?:نامکمل|غیر\s+مکمل|دوبارہ\s+کھولیں|دوبارہ\s+کھولو|واپس\s+کھولیں)(?:\s+{do})?{tail}$",
        Uncomplete,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:کو\s+)?(?:(?:نامکمل|غیر\s+مکمل)\s+{do}|(?:دوبارہ|واپس)\s+(?:کھولیں|کھولو))$",
        Uncomplete,
        Required,
    ),
    rule(
        r"^{lead_ur}(?:namukammal|incomplete|uncomplete|reopen|(?:dobara|wapas)\s+kholo)(?:\s+{do_r})?{tail}$",
        Uncomplete,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:ko\s+)?(?:(?:namukammal|incomplete|uncomplete|not\s+done)\s+{do_r}|(?:dobara|wapas)\s+kholo|reopen\s+{do_r})$",
        Uncomplete,
        Required,
    ),
    // Complete
    rule(
        r"^{lead_ur}(?:مکمل|ختم)(?:\s+{do})?{tail}$",
        Complete,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:کو\s+)?(?:مکمل|ختم)\s+{do}$",
        Complete,
        Required,
    ),
    rule(
        r"^(?P<title>.+?)\s+(?:مکمل\s+)?(?:ہو\s+گیا|ہو\s+گئی|ہوگیا|ہوگئی)$",
        Complete,
        Required,
    ),
    rule(
        r"^{lead_ur}(?:mukammal|complete|khatam|done)(?:\s+{do_r})?{tail}$",
        Complete,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:ko\s+)?(?:mukammal|complete|khatam|done)\s+{do_r}$",
        Complete,
        Required,
    ),
    rule(
        r"^(?P<title>.+?)\s+(?:ho\s+gaya|ho\s+gayi|hogaya|hogayi)$",
        Complete,
        Required,
    ),
    // Delete
    rule(
        r"^{lead_ur}(?:حذف|ڈیلیٹ|مٹا|ہٹا)(?:\s+(?:{do}|دیں|دو))?{tail}$",
        Delete,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:کو\s+)?(?:(?:حذف|ڈیلیٹ)\s+{do}|(?:مٹا|ہٹا)\s+(?:دیں|دو|{do}))$",
        Delete,
        Required,
    ),
    rule(
        r"^{lead_ur}(?:delete|remove|hatao|mitao|(?:hata|mita)\s+do)(?:\s+{do_r})?{tail}$",
        Delete,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:ko\s+)?(?:(?:delete|remove)\s+{do_r}|(?:hata|mita)\s+do|hatao|mitao)$",
        Delete,
        Required,
    ),
    // Search
    rule(
        r"^{lead_ur}(?:تلاش|ڈھونڈیں|ڈھونڈو)(?:\s+{do})?{tail}$",
        Search,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:کو\s+)?(?:تلاش\s+{do}|ڈھونڈیں|ڈھونڈو)$",
        Search,
        Required,
    ),
    rule(
        r"^{lead_ur}(?:talash|search|dhoondo|dhundo|dhoondho)(?:\s+{do_r})?{tail}$",
        Search,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:ko\s+)?(?:(?:talash|search)\s+{do_r}|dhoondo|dhundo)$",
        Search,
        Required,
    ),
    // List
    rule(
        r"^{lead_ur}(?:(?:تمام|سارے|میرے|اپنے)\s+)*(?:کام|ٹاسک|فہرست|کاموں\s+کی\s+فہرست)(?:\s+{show})?$",
        List,
        NoTitle,
    ),
    rule(
        r"^(?:مجھے\s+)?(?:آج\s+)?کیا\s+کرنا\s+ہے$",
        List,
        NoTitle,
    ),
    rule(
        r"^{lead_ur}(?:(?:sab|saare|sare|mere|meray|apne)\s+)*(?:kaam|tasks|list)(?:\s+{show_r})?$",
        List,
        NoTitle,
    ),
    // Create, verb-final forms
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:کو\s+)?(?:(?:شامل|ایڈ|درج)\s+{do}|(?:کام\s+)?(?:بنائیں|بناؤ))$",
        Create,
        Required,
    ),
    rule(
        r"^{lead_ur}(?P<title>.+?)\s+(?:ko\s+)?(?:add|shamil|darj)\s+{do_r}$",
        Create,
        Required,
    ),
];
