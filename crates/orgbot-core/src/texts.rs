//! User-facing message texts

pub const WELCOME: &str = "привет!\n\nперед тем как попасть в оргком поречья 46 ответь, пожалуйста, на несколько вопросов!\n\nкак тебя зовут?";

pub const COURSE_PROMPT: &str = "на каком ты курсе?";

pub const MOTIVATION_PROMPT: &str = "теперь самый важный вопрос!\n\nзачем и почему ты хочешь делать поречье 46?\nподумай немного и расскажи здесь!";

pub const REPEAT: &str = "Повторите ввод";

pub const REPEAT_INVALID_FORMAT: &str = "Повторите ввод (некорректный формат)";

pub const SEND_TEXT: &str = "Отправь мне текст!";

pub const CANCELLED: &str = "окей, отменил! набери /start, если передумаешь";

pub const NOTHING_TO_CANCEL: &str = "сейчас нечего отменять — набери /start, чтобы начать";

/// Answer meaning "six or more"; checked before numeric parsing.
pub const SENIOR_SENTINEL: &str = "6+";

/// Reply-keyboard labels for the course question, row by row.
pub const COURSE_CHOICES: [[&str; 3]; 2] = [["1", "2", "3"], ["4", "5", "6+"]];

/// Closing message after the motivation step.
pub fn final_junior(invite_link: &str) -> String {
    format!(
        "круто!\nспасибо, что рассказал, зачем и почему хочешь делать поречье 46. оно будет уже через 2,5 месяца. времени не очень много, поэтому можешь смело заходить в оргком — <a href=\"{invite_link}\">добро пожаловать</a>!"
    )
}

/// Closing message for the early exit (course above four or "6+").
pub fn final_senior(invite_link: &str) -> String {
    format!(
        "ого!\n\nвот это действительно взрослые люди решили подключиться к нам!\nрад видеть! не буду томить, заходи в оргком — <a href=\"{invite_link}\">добро пожаловать</a>!"
    )
}
