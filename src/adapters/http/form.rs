use super::AppState;
use crate::ports::assets::AssetStore;
use crate::ports::inference::InferencePort;
use crate::ports::staging::LocalStager;
use axum::extract::State;
use axum::response::Html;

pub async fn index<S, A, I>(State(state): State<AppState<S, A, I>>) -> Html<String>
where
    S: LocalStager + 'static,
    A: AssetStore + 'static,
    I: InferencePort,
{
    let mut extensions: Vec<&str> = state.describe.formats().extensions().collect();
    extensions.sort_unstable();
    let accept = extensions
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");

    Html(format!(
        r#"
        <!doctype html>
        <html>
            <head>
                <title>Diagnose your maize</title>
            </head>
            <body>
                <h1>Upload photos or videos of your crop</h1>
                <p>Supported formats: {}</p>
                <form action="/describe" method="post" enctype="multipart/form-data">
                    <div>
                        <label>
                            Media files:
                            <input type="file" name="file" accept="{}" multiple>
                        </label>
                    </div>
                    <div>
                        <input type="submit" value="Diagnose">
                    </div>
                </form>
            </body>
        </html>
        "#,
        extensions.join(", "),
        accept
    ))
}
