//! Server-rendered HTML pages.
//!
//! Templates live in `templates/` and are compiled in with `include_str!`.
//! Placeholders are `{{UPPER_CASE}}` markers replaced with pre-escaped
//! fragments; every value that came from a user or the backend goes
//! through [`escape`] before it is spliced in. Escaped text carries no
//! literal braces, so a later `.replace` never matches inside it.

use uuid::Uuid;

use crate::backend::{Doctor, Patient};
use crate::services::link::{Directory, LINK_FAILURE, LINK_SUCCESS};
use crate::services::pdf::PdfListing;

const LAYOUT: &str = include_str!("../templates/layout.html");
const LANDING: &str = include_str!("../templates/landing.html");
const DOCTOR_DASHBOARD: &str = include_str!("../templates/doctor_dashboard.html");
const UPLOADED_PDFS: &str = include_str!("../templates/uploaded_pdfs.html");
const LINKED_PATIENTS: &str = include_str!("../templates/linked_patients.html");
const PATIENT_DASHBOARD: &str = include_str!("../templates/patient_dashboard.html");
const LINK_DIRECTORY: &str = include_str!("../templates/link_directory.html");
const PROFILE: &str = include_str!("../templates/profile.html");

pub const PROFILE_FETCH_FAILED: &str = "Failed to fetch linked patients.";

const DOCTOR_NAV: &str = r#"<a href="/doctor/dashboard">Dashboard</a>
    <a href="/doctor/dashboard/uploaded-pdf">PDFs</a>
    <a href="/doctor/dashboard/linked-patients">Patients</a>
    <a href="/link">Link</a>
    <a href="/profile">Profile</a>
    <form class="inline" method="post" action="/auth/logout"><button type="submit">Sign out</button></form>"#;

const PATIENT_NAV: &str = r#"<a href="/patient/dashboard">Dashboard</a>
    <form class="inline" method="post" action="/auth/logout"><button type="submit">Sign out</button></form>"#;

/// One-line status shown above a page after a redirect. Carried in the
/// `status` query parameter as a fixed code so arbitrary text is never
/// reflected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SignInFailed,
    UnknownAccount,
    SignUpInvalid,
    AccountExists,
    SignUpFailed,
    ConfirmEmail,
    SignedOut,
    Uploaded,
    NoFile,
    UploadFailed,
    Linked,
    LinkFailed,
    Unlinked,
    UnlinkFailed,
}

impl Notice {
    const ALL: [Self; 14] = [
        Self::SignInFailed,
        Self::UnknownAccount,
        Self::SignUpInvalid,
        Self::AccountExists,
        Self::SignUpFailed,
        Self::ConfirmEmail,
        Self::SignedOut,
        Self::Uploaded,
        Self::NoFile,
        Self::UploadFailed,
        Self::Linked,
        Self::LinkFailed,
        Self::Unlinked,
        Self::UnlinkFailed,
    ];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::SignInFailed => "sign-in-failed",
            Self::UnknownAccount => "unknown-account",
            Self::SignUpInvalid => "sign-up-invalid",
            Self::AccountExists => "account-exists",
            Self::SignUpFailed => "sign-up-failed",
            Self::ConfirmEmail => "confirm-email",
            Self::SignedOut => "signed-out",
            Self::Uploaded => "uploaded",
            Self::NoFile => "no-file",
            Self::UploadFailed => "upload-failed",
            Self::Linked => "linked",
            Self::LinkFailed => "link-failed",
            Self::Unlinked => "unlinked",
            Self::UnlinkFailed => "unlink-failed",
        }
    }

    /// Unknown codes are ignored.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.code() == code)
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::SignInFailed => "Invalid email or password.",
            Self::UnknownAccount => "No doctor or patient account uses that email.",
            Self::SignUpInvalid => "Please fill in every field. Passwords need at least 6 characters.",
            Self::AccountExists => "An account with that email already exists.",
            Self::SignUpFailed => "Sign-up failed. Please try again.",
            Self::ConfirmEmail => "Check your inbox to confirm your email, then sign in.",
            Self::SignedOut => "You have been signed out.",
            Self::Uploaded => "File uploaded successfully.",
            Self::NoFile => "Please choose a file to upload.",
            Self::UploadFailed => "Upload failed. Please try again.",
            Self::Linked => LINK_SUCCESS,
            Self::LinkFailed => LINK_FAILURE,
            Self::Unlinked => "Patient unlinked.",
            Self::UnlinkFailed => "Failed to unlink patient.",
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        !matches!(self, Self::ConfirmEmail | Self::SignedOut | Self::Uploaded | Self::Linked | Self::Unlinked)
    }

    /// `path?status=code`, or `path&status=code` if `path` has a query.
    #[must_use]
    pub fn redirect_target(self, path: &str) -> String {
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{path}{sep}status={}", self.code())
    }
}

/// Escape text for HTML element content and quoted attribute values.
/// Braces become character references so user text cannot form a placeholder.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

fn notice_html(notice: Option<Notice>) -> String {
    notice.map_or_else(String::new, |n| {
        let class = if n.is_error() { "err" } else { "ok" };
        format!(r#"<div class="notice {class}">{}</div>"#, escape(n.message()))
    })
}

fn layout(title: &str, nav: &str, notice: Option<Notice>, body: &str) -> String {
    LAYOUT
        .replace("{{TITLE}}", &escape(title))
        .replace("{{NAV}}", nav)
        .replace("{{NOTICE}}", &notice_html(notice))
        .replace("{{BODY}}", body)
}

fn empty(message: &str) -> String {
    format!("<p>{}</p>", escape(message))
}

fn patient_rows(patients: &[Patient], action: impl Fn(&Patient) -> String) -> String {
    let rows: String = patients
        .iter()
        .map(|p| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&p.name),
                escape(&p.email),
                action(p)
            )
        })
        .collect();
    format!("<table><tr><th>Name</th><th>Email</th><th></th></tr>{rows}</table>")
}

fn specialty_line(doctor: &Doctor) -> String {
    doctor.specialty.as_deref().map(escape).unwrap_or_default()
}

#[must_use]
pub fn landing(notice: Option<Notice>) -> String {
    layout("Welcome", "", notice, LANDING)
}

/// Doctor home: upload form, patient search results, and linked patients.
#[must_use]
pub fn doctor_dashboard(
    doctor: &Doctor,
    query: &str,
    results: &[Patient],
    linked: &[Patient],
    notice: Option<Notice>,
) -> String {
    let results_html = if query.trim().is_empty() {
        String::new()
    } else if results.is_empty() {
        empty("No patients match that search.")
    } else {
        patient_rows(results, |p| {
            format!(
                r#"<form class="inline" method="post" action="/doctor/dashboard/link"><input type="hidden" name="patient_id" value="{}"><button type="submit">Link</button></form>"#,
                p.patient_id
            )
        })
    };
    let linked_html = if linked.is_empty() {
        empty("No linked patients yet.")
    } else {
        patient_rows(linked, |_| String::new())
    };

    let body = DOCTOR_DASHBOARD
        .replace("{{NAME}}", &escape(&doctor.name))
        .replace("{{SPECIALTY}}", &specialty_line(doctor))
        .replace("{{QUERY}}", &escape(query))
        .replace("{{RESULTS}}", &results_html)
        .replace("{{LINKED}}", &linked_html);
    layout("Doctor dashboard", DOCTOR_NAV, notice, &body)
}

#[must_use]
pub fn uploaded_pdfs(listings: &[PdfListing]) -> String {
    let pdfs = if listings.is_empty() {
        empty("No PDFs uploaded yet.")
    } else {
        let items: String = listings
            .iter()
            .map(|l| {
                let name = escape(&l.file_name);
                let uploaded = l.record.uploaddate.date();
                match &l.signed_url {
                    Some(url) => format!(
                        r#"<li><a href="{}" target="_blank" rel="noopener">{name}</a> ({uploaded})</li>"#,
                        escape(url)
                    ),
                    None => format!("<li>{name} ({uploaded}, link unavailable)</li>"),
                }
            })
            .collect();
        format!("<ul>{items}</ul>")
    };
    layout("Uploaded PDFs", DOCTOR_NAV, None, &UPLOADED_PDFS.replace("{{PDFS}}", &pdfs))
}

/// Linked patients, each with an unlink button.
#[must_use]
pub fn linked_patients(patients: &[Patient], notice: Option<Notice>) -> String {
    let html = if patients.is_empty() {
        empty("No linked patients.")
    } else {
        patient_rows(patients, |p| {
            format!(
                r#"<form class="inline" method="post" action="/doctor/dashboard/linked-patients/{}/delete"><button type="submit">Delete</button></form>"#,
                p.patient_id
            )
        })
    };
    layout("Linked patients", DOCTOR_NAV, notice, &LINKED_PATIENTS.replace("{{PATIENTS}}", &html))
}

#[must_use]
pub fn patient_dashboard(patient: &Patient, doctors: &[Doctor]) -> String {
    let html = if doctors.is_empty() {
        empty("No doctors linked yet.")
    } else {
        let rows: String = doctors
            .iter()
            .map(|d| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape(&d.name),
                    specialty_line(d),
                    escape(&d.email)
                )
            })
            .collect();
        format!("<table><tr><th>Name</th><th>Specialty</th><th>Email</th></tr>{rows}</table>")
    };
    let body = PATIENT_DASHBOARD
        .replace("{{NAME}}", &escape(&patient.name))
        .replace("{{DOCTORS}}", &html);
    layout("Patient dashboard", PATIENT_NAV, None, &body)
}

fn option(value: Uuid, label: &str, selected: bool) -> String {
    let selected = if selected { " selected" } else { "" };
    format!(r#"<option value="{value}"{selected}>{}</option>"#, escape(label))
}

/// Directory linking page. `selected` is the doctor whose patients are
/// listed below the form.
#[must_use]
pub fn link_directory(
    directory: &Directory,
    selected: Option<Uuid>,
    selected_patients: &[Patient],
    notice: Option<Notice>,
) -> String {
    let doctor_options: String = directory
        .doctors
        .iter()
        .map(|d| option(d.doctor_id, &d.name, Some(d.doctor_id) == selected))
        .collect();
    let patient_options: String = directory
        .patients
        .iter()
        .map(|p| option(p.patient_id, &p.name, false))
        .collect();
    let selected_html = match selected {
        None => String::new(),
        Some(_) if selected_patients.is_empty() => empty("This doctor has no linked patients."),
        Some(_) => patient_rows(selected_patients, |_| String::new()),
    };

    let body = LINK_DIRECTORY
        .replace("{{DOCTOR_OPTIONS}}", &doctor_options)
        .replace("{{PATIENT_OPTIONS}}", &patient_options)
        .replace("{{SELECTED_PATIENTS}}", &selected_html);
    layout("Link profiles", DOCTOR_NAV, notice, &body)
}

/// Doctor profile. `patients` is `None` when the lookup failed.
#[must_use]
pub fn profile(doctor: &Doctor, patients: Option<&[Patient]>) -> String {
    let html = match patients {
        None => format!(r#"<div class="notice err">{}</div>"#, escape(PROFILE_FETCH_FAILED)),
        Some([]) => empty("No linked patients."),
        Some(patients) => patient_rows(patients, |_| String::new()),
    };
    let body = PROFILE
        .replace("{{NAME}}", &escape(&doctor.name))
        .replace("{{EMAIL}}", &escape(&doctor.email))
        .replace("{{SPECIALTY}}", &specialty_line(doctor))
        .replace("{{PATIENTS}}", &html);
    layout("Profile", DOCTOR_NAV, None, &body)
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
