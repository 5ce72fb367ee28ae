//! User-facing reply texts.

use cvup_types::{DocumentType, EmailAddress, VerificationCode};

pub(crate) const WELCOME: &str = "Welcome to CV_UP! 🌟
Here you can:
1. Get your CV corrected ✍️
2. Get a ready CV model (junior/senior) 📄
3. Access general resources 📚
4. Ask questions (Q&A) ❓
5. Find job offers 💼
6. Prepare for interviews 🎯

Use /help to see available commands.";

pub(crate) const HELP: &str = "Available commands:
/start - show the welcome message
/sendcv <email> <junior|senior> - request a CV template
/verify_<CODE> - claim your CV once the post is liked and commented
/ask [#category] <question> - ask us anything
/myquestions - your questions and our answers
/mycvs - your CV requests";

pub(crate) const UNKNOWN_COMMAND: &str = "Sorry, I don't know that command. Use /help to see available commands.";
pub(crate) const INVALID_EMAIL: &str = "Please provide a valid email address.";
pub(crate) const INVALID_TYPE: &str = "CV type must be either 'junior' or 'senior'";
pub(crate) const ALREADY_ISSUED: &str =
    "You have already received this CV type. Each user can only get one copy of each CV type.";
pub(crate) const INVALID_CODE: &str = "Invalid or expired verification code. Please try again.";
pub(crate) const CLAIM_IN_PROGRESS: &str =
    "Your verification is already being processed. Please wait a moment.";
pub(crate) const GATE_UNAVAILABLE: &str =
    "We could not check your verification right now. Please try again in a few minutes.";
pub(crate) const DELIVERY_FAILED: &str = "Verification successful but there was an error sending the CV. Please try again or contact support.";
pub(crate) const INTERNAL_ERROR: &str = "An error occurred. Please try again or contact support.";
pub(crate) const NO_QUESTIONS: &str = "You haven't asked any questions yet.";
pub(crate) const NO_REQUESTS: &str = "You haven't requested any CV yet. Use /sendcv to get one.";
pub(crate) const VERIFY_LINK_LABEL: &str = "Open the verification post";

pub(crate) fn verification_steps(code: &VerificationCode, email: &EmailAddress) -> String {
    format!(
        "Please follow these steps to receive your CV:\n\n\
         1. Click the button below to open our post\n\
         2. Like the post\n\
         3. Comment with this code: {code}\n\
         4. Return here and click /verify_{code}\n\n\
         Once verified, your CV will be sent to {email}"
    )
}

pub(crate) fn not_verified(code: &VerificationCode) -> String {
    format!(
        "Verification failed. Please ensure you've liked the post and commented with the code {code}."
    )
}

pub(crate) fn delivered(email: &EmailAddress, document_type: DocumentType) -> String {
    format!(
        "Verification successful! Your {} CV has been sent to {email}. \
         Please check your inbox (and spam folder).",
        document_type.title()
    )
}

pub(crate) fn question_recorded(category: &str) -> String {
    format!("Thanks! Your question was recorded under #{category}. We'll answer as soon as possible. Use /myquestions to check.")
}
