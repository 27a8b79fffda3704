use time::macros::datetime;

use super::*;
use crate::backend::PdfRecord;

fn doctor() -> Doctor {
    Doctor {
        doctor_id: Uuid::new_v4(),
        uid: Uuid::new_v4(),
        name: "Dr. <Ada>".into(),
        email: "ada@example.com".into(),
        specialty: Some("Cardiology".into()),
    }
}

fn patient(name: &str) -> Patient {
    Patient {
        patient_id: Uuid::new_v4(),
        uid: Uuid::new_v4(),
        name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

#[test]
fn escape_covers_markup_characters() {
    assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    assert_eq!(escape("plain"), "plain");
}

#[test]
fn escape_neutralizes_placeholder_braces() {
    assert_eq!(escape("{{QUERY}}"), "&#123;&#123;QUERY&#125;&#125;");
}

#[test]
fn names_shaped_like_placeholders_render_literally() {
    let mut d = doctor();
    d.name = "{{QUERY}}".into();
    d.specialty = Some("{{RESULTS}}".into());
    let page = doctor_dashboard(&d, "secret-search-text", &[], &[], None);
    assert!(page.contains("Welcome, &#123;&#123;QUERY&#125;&#125;"));
    assert!(page.contains("&#123;&#123;RESULTS&#125;&#125;"));
    assert_eq!(page.matches("secret-search-text").count(), 1);

    let mut p = patient("Pat");
    p.name = "{{DOCTORS}}".into();
    let page = patient_dashboard(&p, std::slice::from_ref(&doctor()));
    assert!(page.contains("&#123;&#123;DOCTORS&#125;&#125;"));
    assert!(!page.contains("{{"));
}

#[test]
fn notice_codes_round_trip_and_unknown_is_ignored() {
    for notice in Notice::ALL {
        assert_eq!(Notice::from_code(notice.code()), Some(notice));
    }
    assert_eq!(Notice::from_code("<script>"), None);
}

#[test]
fn link_notices_use_fixed_messages() {
    assert_eq!(Notice::Linked.message(), "Successfully linked doctor and patient profiles.");
    assert_eq!(Notice::LinkFailed.message(), "Failed to link profiles. Please try again.");
    assert!(!Notice::Linked.is_error());
    assert!(Notice::LinkFailed.is_error());
}

#[test]
fn redirect_target_appends_status() {
    assert_eq!(Notice::Uploaded.redirect_target("/doctor/dashboard"), "/doctor/dashboard?status=uploaded");
    assert_eq!(Notice::Linked.redirect_target("/link?doctor_id=1"), "/link?doctor_id=1&status=linked");
}

#[test]
fn no_placeholders_survive_rendering() {
    let d = doctor();
    let pats = vec![patient("Pat")];
    let dir = Directory { doctors: vec![d.clone()], patients: pats.clone() };
    let pages = [
        landing(Some(Notice::SignedOut)),
        doctor_dashboard(&d, "pat", &pats, &pats, None),
        uploaded_pdfs(&[]),
        linked_patients(&pats, None),
        patient_dashboard(&pats[0], std::slice::from_ref(&d)),
        link_directory(&dir, Some(d.doctor_id), &pats, None),
        profile(&d, Some(pats.as_slice())),
    ];
    for page in pages {
        assert!(!page.contains("{{"), "unreplaced placeholder in:\n{page}");
    }
}

#[test]
fn doctor_names_are_escaped() {
    let page = doctor_dashboard(&doctor(), "", &[], &[], None);
    assert!(page.contains("Welcome, Dr. &lt;Ada&gt;"));
    assert!(!page.contains("<Ada>"));
}

#[test]
fn search_results_offer_link_buttons() {
    let pat = patient("Pat");
    let page = doctor_dashboard(&doctor(), "pat", std::slice::from_ref(&pat), &[], None);
    assert!(page.contains(&format!(r#"name="patient_id" value="{}""#, pat.patient_id)));
    let page = doctor_dashboard(&doctor(), "zzz", &[], &[], None);
    assert!(page.contains("No patients match that search."));
}

#[test]
fn linked_patients_have_delete_forms() {
    let pat = patient("Pat");
    let page = linked_patients(std::slice::from_ref(&pat), Some(Notice::Unlinked));
    assert!(page.contains(&format!("/doctor/dashboard/linked-patients/{}/delete", pat.patient_id)));
    assert!(page.contains("Patient unlinked."));
}

#[test]
fn pdf_without_url_renders_without_link() {
    let record = PdfRecord {
        id: Uuid::new_v4(),
        doctor_id: Uuid::new_v4(),
        filepath: "pdfs/x/a.pdf".into(),
        uploaddate: datetime!(2024-03-01 10:00 UTC),
    };
    let signed = PdfListing {
        record: record.clone(),
        file_name: "a.pdf".into(),
        signed_url: Some("http://h/sign/a.pdf?token=t&expires_in=60".into()),
    };
    let unsigned = PdfListing { record, file_name: "a.pdf".into(), signed_url: None };
    let page = uploaded_pdfs(&[signed, unsigned]);
    assert!(page.contains(r#"href="http://h/sign/a.pdf?token=t&amp;expires_in=60""#));
    assert!(page.contains("a.pdf (2024-03-01, link unavailable)"));
}

#[test]
fn profile_failure_shows_fixed_message() {
    let page = profile(&doctor(), None);
    assert!(page.contains("Failed to fetch linked patients."));
}

#[test]
fn directory_marks_selected_doctor() {
    let d = doctor();
    let dir = Directory { doctors: vec![d.clone()], patients: vec![] };
    let page = link_directory(&dir, Some(d.doctor_id), &[], None);
    assert!(page.contains(&format!(r#"<option value="{}" selected>"#, d.doctor_id)));
    assert!(page.contains("This doctor has no linked patients."));
}
