use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const COLLEGES: [&str; 20] = [
    "Indian Institute of Technology Bombay (IIT Bombay)",
    "Indian Institute of Technology Delhi (IIT Delhi)",
    "Indian Institute of Technology Madras (IIT Madras)",
    "Indian Institute of Technology Kanpur (IIT Kanpur)",
    "Indian Institute of Technology Kharagpur (IIT Kharagpur)",
    "Indian Institute of Science (IISc) Bangalore",
    "All India Institute of Medical Sciences (AIIMS), New Delhi",
    "Jawaharlal Nehru University (JNU), New Delhi",
    "University of Delhi (DU)",
    "Banaras Hindu University (BHU), Varanasi",
    "Vellore Institute of Technology (VIT), Vellore",
    "Amrita Vishwa Vidyapeetham, Coimbatore",
    "National Institute of Technology Tiruchirappalli (NIT Trichy)",
    "Anna University, Chennai",
    "Indian Institute of Management Ahmedabad (IIM Ahmedabad)",
    "Jadavpur University, Kolkata",
    "BITS Pilani - Pilani Campus",
    "Delhi Technological University (DTU)",
    "Pune Institute of Computer Technology",
    "Manipal Academy of Higher Education, Manipal",
];

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CollegesResponse {
    pub success: bool,
    pub colleges: Vec<String>,
}

/// Static list used by the signup form; does not touch the database.
#[utoipa::path(
    get,
    path = "/api/colleges",
    responses((status = 200, description = "Known colleges", body = CollegesResponse)),
    tag = "alumna"
)]
pub async fn colleges() -> Json<CollegesResponse> {
    Json(CollegesResponse {
        success: true,
        colleges: COLLEGES.iter().map(ToString::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_twenty_unique_colleges() {
        let Json(response) = colleges().await;
        assert!(response.success);
        assert_eq!(response.colleges.len(), 20);
        let mut sorted = response.colleges.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 20);
    }
}
