//! Demo catalogue loaded into the local store when no backend is configured.

use time::{Duration, OffsetDateTime};

use crate::domain::entities::{BlogPost, BookingForm, Course, CourseVideo, Video};

const IMAGE_BASE: &str = "https://images.pexels.com/photos";
const DEMO_VIDEO_URL: &str = "https://www.youtube.com/embed/dQw4w9WgXcQ";
const DEMO_YOUTUBE_ID: &str = "dQw4w9WgXcQ";

/// Every seeded collection, timestamps anchored at `now`.
#[derive(Debug, Clone)]
pub struct DemoContent {
    pub blog_posts: Vec<BlogPost>,
    pub courses: Vec<Course>,
    pub course_videos: Vec<CourseVideo>,
    pub videos: Vec<Video>,
    pub booking_forms: Vec<BookingForm>,
}

impl DemoContent {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            blog_posts: blog_posts(now),
            courses: courses(now),
            course_videos: course_videos(now),
            videos: videos(now),
            booking_forms: booking_forms(now),
        }
    }
}

fn image(photo: u32) -> Option<String> {
    Some(format!(
        "{IMAGE_BASE}/{photo}/pexels-photo-{photo}.jpeg?auto=compress&cs=tinysrgb&w=800"
    ))
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|tag| (*tag).to_owned()).collect()
}

fn blog_posts(now: OffsetDateTime) -> Vec<BlogPost> {
    let week_ago = now - Duration::days(7);
    let three_days_ago = now - Duration::days(3);
    let yesterday = now - Duration::days(1);

    vec![
        BlogPost {
            id: "1".into(),
            title: "Getting Started with Lean Six Sigma".into(),
            content: "Lean Six Sigma combines the waste reduction of Lean with the quality \
                      focus of Six Sigma. Every process has room for improvement: remove \
                      waste, reduce variation, and both efficiency and quality follow."
                .into(),
            excerpt: "The fundamental principles of Lean Six Sigma and how they raise \
                      efficiency and quality."
                .into(),
            author: "Divyanshu Singh".into(),
            is_published: true,
            featured_image_url: image(3184298),
            tags: tags(&["lean", "six sigma", "process improvement", "quality"]),
            created_at: week_ago,
            updated_at: week_ago,
            published_at: Some(week_ago),
        },
        BlogPost {
            id: "2".into(),
            title: "The Power of Kaizen in Daily Operations".into(),
            content: "Kaizen means continuous improvement. Small incremental changes \
                      compound over time, and anyone at any level of the organization can \
                      make them."
                .into(),
            excerpt: "How small, incremental improvements create lasting change.".into(),
            author: "Rinesh Kumar".into(),
            is_published: true,
            featured_image_url: image(3184465),
            tags: tags(&["kaizen", "continuous improvement", "culture", "operations"]),
            created_at: three_days_ago,
            updated_at: three_days_ago,
            published_at: Some(three_days_ago),
        },
        BlogPost {
            id: "3".into(),
            title: "Digital Transformation Through Lean Principles".into(),
            content: "Digital transformation is about reimagining how work gets done. Lean \
                      thinking keeps the focus on value and removes digital waste such as \
                      redundant systems and unnecessary approvals."
                .into(),
            excerpt: "Applying Lean principles to digital transformation initiatives.".into(),
            author: "Harsha Patel".into(),
            is_published: false,
            featured_image_url: image(3184339),
            tags: tags(&["digital transformation", "lean", "technology", "innovation"]),
            created_at: yesterday,
            updated_at: yesterday,
            published_at: None,
        },
    ]
}

fn courses(now: OffsetDateTime) -> Vec<Course> {
    let course = |id: &str,
                  title: &str,
                  description: &str,
                  duration: &str,
                  lessons: i32,
                  premium: bool,
                  order: i32| Course {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        duration: duration.into(),
        lessons_count: lessons,
        is_premium: premium,
        thumbnail_url: None,
        order_index: order,
        created_at: now,
        updated_at: now,
    };

    vec![
        course(
            "1",
            "Lean Basics",
            "Fundamental principles of Lean methodology",
            "2 hours",
            8,
            false,
            1,
        ),
        course(
            "2",
            "Six Sigma Belt Overview",
            "Understanding the Six Sigma belt system",
            "3 hours",
            12,
            false,
            2,
        ),
        course(
            "3",
            "DMAIC Process",
            "Define, Measure, Analyze, Improve, Control",
            "4 hours",
            16,
            true,
            3,
        ),
    ]
}

fn course_videos(now: OffsetDateTime) -> Vec<CourseVideo> {
    vec![
        CourseVideo {
            id: "1".into(),
            course_id: "1".into(),
            title: "Introduction to Lean Thinking".into(),
            description: "Overview of Lean principles and philosophy".into(),
            video_url: DEMO_VIDEO_URL.into(),
            duration: "12:30".into(),
            order_index: 0,
            is_preview: true,
            created_at: now,
            updated_at: now,
        },
        CourseVideo {
            id: "2".into(),
            course_id: "1".into(),
            title: "Identifying Waste in Processes".into(),
            description: "Learn to spot the 8 types of waste in any process".into(),
            video_url: DEMO_VIDEO_URL.into(),
            duration: "15:45".into(),
            order_index: 1,
            is_preview: false,
            created_at: now,
            updated_at: now,
        },
    ]
}

fn videos(now: OffsetDateTime) -> Vec<Video> {
    vec![
        Video {
            id: "1".into(),
            title: "Introduction to Lean Methodology".into(),
            description: "Basic introduction to Lean principles".into(),
            youtube_id: DEMO_YOUTUBE_ID.into(),
            category: "courses".into(),
            duration: "15:30".into(),
            views_count: 2300,
            rating: 4.8,
            is_premium: false,
            thumbnail_url: None,
            created_at: now,
            updated_at: now,
        },
        Video {
            id: "2".into(),
            title: "Client Success Story - Manufacturing".into(),
            description: "Real-world implementation case study".into(),
            youtube_id: DEMO_YOUTUBE_ID.into(),
            category: "testimonials".into(),
            duration: "8:45".into(),
            views_count: 1800,
            rating: 4.9,
            is_premium: false,
            thumbnail_url: None,
            created_at: now,
            updated_at: now,
        },
    ]
}

fn booking_forms(now: OffsetDateTime) -> Vec<BookingForm> {
    let form = |id: &str, coach: &str, slug: &str, is_active| BookingForm {
        id: id.into(),
        coach_name: coach.into(),
        form_url: format!("https://forms.google.com/{slug}-booking"),
        is_active,
        created_at: now,
        updated_at: now,
    };

    vec![
        form("1", "Rinesh Kumar", "rinesh", true),
        form("2", "Harsha Patel", "harsha", true),
        form("3", "Divyanshu Singh", "divyanshu", false),
    ]
}
