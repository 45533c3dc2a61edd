//! The news record type.

use serde::{Deserialize, Serialize};

/// One news item as written by the ingestion pipeline.
///
/// Field order is the wire order of the JSON body: title, description,
/// image, url, publish_date. An absent image serializes as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Headline.
    pub title: String,
    /// Short summary shown under the headline.
    pub description: String,
    /// Thumbnail reference, if the article had one.
    pub image: Option<String>,
    /// Canonical article link.
    pub url: String,
    /// Publish timestamp, kept as the source text.
    pub publish_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(image: Option<&str>) -> Record {
        Record {
            title: "제목".into(),
            description: "요약".into(),
            image: image.map(str::to_string),
            url: "https://n.news.naver.com/article/001/0001".into(),
            publish_date: "2022.07.01. 오전 9:00".into(),
        }
    }

    #[test]
    fn serializes_fields_in_wire_order() {
        let json = serde_json::to_string(&sample(Some("https://img/1.jpg"))).unwrap();
        let title = json.find("\"title\"").unwrap();
        let description = json.find("\"description\"").unwrap();
        let image = json.find("\"image\"").unwrap();
        let url = json.find("\"url\"").unwrap();
        let date = json.find("\"publish_date\"").unwrap();
        assert!(title < description && description < image && image < url && url < date);
    }

    #[test]
    fn absent_image_round_trips_through_null() {
        let records = vec![sample(None), sample(Some("https://img/2.jpg"))];
        let body = serde_json::to_string(&records).unwrap();
        assert!(body.contains("\"image\":null"));

        let back: Vec<Record> = serde_json::from_str(&body).unwrap();
        assert_eq!(back, records);
        assert!(back[0].image.is_none());
    }
}
