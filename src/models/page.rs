/// Paged list payloads and the tuple-wrapped list quirk.
///
/// Some backend endpoints serialise a list together with its Java type name,
/// producing `["java.util.ArrayList", [ ... ]]` instead of `[ ... ]`.
/// `RawList` accepts both and `into_vec` yields the plain items.
use serde::{Deserialize, Serialize};

/// A list as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawList<T> {
    Plain(Vec<T>),
    Tagged(String, Vec<T>),
}

impl<T> RawList<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            RawList::Plain(items) => items,
            RawList::Tagged(_, items) => items,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            RawList::Plain(items) => items,
            RawList::Tagged(_, items) => items,
        }
    }
}

impl<T> Default for RawList<T> {
    fn default() -> Self {
        RawList::Plain(Vec::new())
    }
}

impl<T> From<Vec<T>> for RawList<T> {
    fn from(items: Vec<T>) -> Self {
        RawList::Plain(items)
    }
}

/// Spring-style page wrapper.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "RawList::default")]
    pub content: RawList<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    /// Zero-based page index.
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Page<T> {
    pub fn items(&self) -> &[T] {
        self.content.as_slice()
    }

    pub fn is_last(&self) -> bool {
        self.total_pages == 0 || self.number + 1 >= self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
    }

    #[test]
    fn test_plain_list() {
        let list: RawList<Item> = serde_json::from_value(json!([{"name": "a"}])).unwrap();
        assert_eq!(
            list.into_vec(),
            vec![Item {
                name: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_tagged_list() {
        let list: RawList<Item> = serde_json::from_value(json!([
            "java.util.ArrayList",
            [{"name": "a"}, {"name": "b"}]
        ]))
        .unwrap();
        assert!(matches!(list, RawList::Tagged(..)));
        assert_eq!(list.into_vec().len(), 2);
    }

    #[test]
    fn test_tagged_empty_list() {
        let list: RawList<Item> =
            serde_json::from_value(json!(["java.util.ArrayList", []])).unwrap();
        assert!(list.into_vec().is_empty());
    }

    #[test]
    fn test_page_with_tagged_content() {
        let page: Page<Item> = serde_json::from_value(json!({
            "content": ["java.util.ArrayList", [{"name": "x"}]],
            "totalElements": 95,
            "totalPages": 10,
            "number": 9,
            "size": 10
        }))
        .unwrap();
        assert_eq!(page.items().len(), 1);
        assert_eq!(page.total_elements, 95);
        assert!(page.is_last());
    }
}
