use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Implements the TEXT column mapping shared by the enums below.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        "invalid {}: {}",
                        stringify!($name),
                        other
                    )),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

/// The two independent engagement relations a user can hold on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementKind {
    Like,
    Collection,
}

text_enum!(EngagementKind {
    Like => "like",
    Collection => "collection",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Image,
    Video,
}

text_enum!(PostType {
    Image => "image",
    Video => "video",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Secret,
}

text_enum!(Gender {
    Male => "male",
    Female => "female",
    Secret => "secret",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub nickname: String,
    pub avatar: String,
    pub gender: Gender,
    pub bio: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub url: String,
    pub cover_url: Option<String>,
    pub author_id: i64,
    pub created_at: String,
}

/// A post as shown in feeds: the author's display fields ride along.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: String,
    pub author_avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementRelation {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub kind: EngagementKind,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: String,
    pub author_avatar: String,
}

/// One comment in a post's thread, with its direct replies oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub entry: CommentWithAuthor,
    #[serde(rename = "subComments")]
    pub replies: Vec<CommentNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_kind_parses_its_own_text() {
        for kind in [EngagementKind::Like, EngagementKind::Collection] {
            assert_eq!(kind.as_str().parse::<EngagementKind>().unwrap(), kind);
        }
        assert!("heart".parse::<EngagementKind>().is_err());
    }

    #[test]
    fn post_serializes_type_field() {
        let post = Post {
            id: 1,
            title: "Sunset".into(),
            description: None,
            post_type: PostType::Video,
            url: "http://localhost/uploads/a.mp4".into(),
            cover_url: None,
            author_id: 2,
            created_at: "2025-01-15 12:00:00".into(),
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["type"], "video");
        assert!(json.get("post_type").is_none());
    }

    #[test]
    fn user_never_serializes_password_hash() {
        let user = User {
            id: 1,
            username: "alice".into(),
            password_hash: "$2b$04$secret".into(),
            nickname: "Alice".into(),
            avatar: "a.png".into(),
            gender: Gender::default(),
            bio: None,
            created_at: "2025-01-15 12:00:00".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("\"gender\":\"secret\""));
    }

    #[test]
    fn post_with_author_flattens_post_fields() {
        let entry = PostWithAuthor {
            post: Post {
                id: 3,
                title: "Hike".into(),
                description: Some("trail".into()),
                post_type: PostType::Image,
                url: "u".into(),
                cover_url: None,
                author_id: 1,
                created_at: "2025-01-15 12:00:00".into(),
            },
            author: "Alice".into(),
            author_avatar: "a.png".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["author"], "Alice");
        assert_eq!(json["author_avatar"], "a.png");
    }

    #[test]
    fn comment_node_nests_replies_as_sub_comments() {
        let entry = |id, parent_id| CommentWithAuthor {
            comment: Comment {
                id,
                post_id: 7,
                user_id: 1,
                parent_id,
                content: "nice".into(),
                created_at: "2025-01-15 12:00:00".into(),
            },
            author: "Alice".into(),
            author_avatar: "a.png".into(),
        };
        let node = CommentNode {
            entry: entry(1, None),
            replies: vec![CommentNode {
                entry: entry(2, Some(1)),
                replies: Vec::new(),
            }],
        };

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["id"], 1);
        assert!(json["parent_id"].is_null());
        assert_eq!(json["author"], "Alice");
        assert_eq!(json["subComments"][0]["parent_id"], 1);
        assert_eq!(json["subComments"][0]["subComments"], serde_json::json!([]));
    }
}
