//! Composite prompt construction for the vision-language model.

use super::media::AssetHandle;

/// One `<tag src="content/type;asset_id,ID" />` reference per asset,
/// followed by the query text.
pub fn compose(assets: &[AssetHandle], query: &str) -> String {
    let references: String = assets
        .iter()
        .map(|asset| {
            format!(
                "<{} src=\"{};asset_id,{}\" />",
                asset.category.tag(),
                asset.content_type,
                asset.asset_id
            )
        })
        .collect();
    format!("{}{}", references, query)
}

/// Comma-joined asset ids, as carried in the request-scoped headers.
pub fn joined_ids(assets: &[AssetHandle]) -> String {
    assets
        .iter()
        .map(|a| a.asset_id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
