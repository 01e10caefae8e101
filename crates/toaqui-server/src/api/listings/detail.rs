use chrono::{DateTime, Utc};
use serde::Serialize;
use toaqui_core::{day_name, format_review_date, ListingView};
use uuid::Uuid;

/// Full listing record for the detail page.
#[derive(Debug, Serialize)]
pub(in crate::api) struct ListingDetail {
    pub id: Uuid,
    pub index: i32,
    pub logo: String,
    pub image: String,
    pub link: String,
    pub name: String,
    pub category: String,
    pub person: String,
    pub email: String,
    pub stars: i32,
    pub phone: String,
    pub address: String,
    pub about: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub services: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_in_meters: Option<f64>,
    pub is_open: bool,
    pub opening_status: String,
    pub reviews: Vec<ReviewDetail>,
    pub opening_hours: Vec<OpeningHoursDetail>,
    pub contacts: Vec<ContactDetail>,
    pub review_count: usize,
    pub description: String,
    pub gallery: Vec<GalleryImage>,
    pub amenities: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ReviewDetail {
    pub author_name: String,
    pub avatar: String,
    pub stars: i32,
    pub content: String,
    /// Month and year, e.g. "Dec 2018".
    pub date: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct OpeningHoursDetail {
    pub day: String,
    pub hours: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ContactDetail {
    pub icon: String,
    pub content: String,
    pub link: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct GalleryImage {
    pub url: String,
    pub alt: String,
    pub caption: String,
}

impl From<ListingView> for ListingDetail {
    fn from(view: ListingView) -> Self {
        let ListingView { listing, status } = view;

        let reviews: Vec<ReviewDetail> = listing
            .reviews
            .into_iter()
            .map(|r| ReviewDetail {
                author_name: r.title,
                avatar: r.avatar,
                stars: r.stars,
                content: r.content,
                date: format_review_date(r.date),
                created_at: r.date,
            })
            .collect();
        let gallery = listing
            .images
            .into_iter()
            .map(|i| GalleryImage {
                url: i.image,
                alt: i.title.clone(),
                caption: i.title,
            })
            .collect();

        Self {
            id: listing.external_id,
            index: listing.index,
            logo: listing.logo,
            image: listing.image,
            link: listing.link,
            name: listing.name,
            category: listing.category,
            person: listing.person,
            email: listing.email,
            stars: listing.stars,
            phone: listing.phone,
            address: listing.address,
            about: listing.about,
            description: listing.summary.clone(),
            summary: listing.summary,
            tags: listing.tags,
            amenities: listing.services.clone(),
            services: listing.services,
            latitude: listing.latitude,
            longitude: listing.longitude,
            distance_in_meters: listing.distance_in_meters,
            is_open: status.is_open,
            opening_status: status.status,
            review_count: reviews.len(),
            reviews,
            opening_hours: listing
                .opening_hours
                .into_iter()
                .map(|h| OpeningHoursDetail {
                    day: day_name(h.day_of_week).to_string(),
                    hours: h.hours,
                })
                .collect(),
            contacts: listing
                .contacts
                .into_iter()
                .map(|c| ContactDetail {
                    icon: c.icon,
                    content: c.content,
                    link: c.link,
                })
                .collect(),
            gallery,
        }
    }
}
