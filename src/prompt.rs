use crate::image_input::ImageInput;
use crate::openai::chat::completions::{Content, ContentPart, CreateRequest, ImageUrl, Message, Role};

pub const SYSTEM_PROMPT: &str = "\
You are an expert assistant trained to analyze car damage for insurance claims.
Your task is to assess images of cars and classify the damage as 'Minor', 'Moderate', or 'Severe', providing reasoning for your classification.

**Role:** Insurance Officer for Automotive Damage Assessment

**Objective:**
1. Analyze images to determine if the car is damaged or not.
2. If damaged, classify the severity as one of the following:
- Minor: Cosmetic damage with little to no impact on functionality.
- Moderate: Noticeable damage that may require repair but doesn't affect the car's structural integrity.
- Severe: Significant damage affecting the car's functionality, safety, or structure, requiring extensive repair.

**Context:**
This system helps automate the insurance claims process for faster and more accurate damage assessments. It will process high-quality images to improve accuracy in determining damage severity and affect claim approval timelines and customer satisfaction.

**Instructions:**
- **Input:** Images of cars taken from multiple angles and under different lighting conditions.
- **Output:**
1. Binary classification: **Damaged** or **Not Damaged**
2. If damaged, classify severity into Minor, Moderate, or Severe with a concise explanation for each classification.

**Considerations:**
- Handle variations in lighting, angles, and backgrounds effectively.
- Identify common types of car damage, such as scratches, dents, cracks, and broken parts.
- Focus on precision and accuracy in determining the damage severity.

**Additional Notes:**
- **Reasoning:** Provide clear and concise reasoning for your predictions, ensuring that the explanation aligns with the visible damage in the image.
- **Accuracy & Precision:** Prioritize high accuracy and precision in both the detection of damage and categorization of severity.
";

pub const USER_PROMPT: &str =
    "What is the severity of the car damage? Please classify as Minor, Moderate, or Severe with reasoning.";

pub const FALLBACK_TEXT: &str = "Failed to analyze the image. Please try again.";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const fn temperature_default() -> f64 {
    0.2
}

const fn top_p_default() -> f64 {
    1.0
}

const fn max_tokens_default() -> u32 {
    100
}

/// Decoding parameters sent with every classification request.
#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    #[serde(default = "temperature_default")]
    pub temperature: f64,
    #[serde(default = "top_p_default")]
    pub top_p: f64,
    #[serde(default = "max_tokens_default")]
    pub max_tokens: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            temperature: temperature_default(),
            top_p: top_p_default(),
            max_tokens: max_tokens_default(),
        }
    }
}

pub fn build_request(model: &str, parameters: &Parameters, image: &ImageInput) -> CreateRequest {
    let messages = vec![
        Message {
            role: Role::System,
            name: None,
            content: Content::Text(SYSTEM_PROMPT.to_string()),
        },
        Message {
            role: Role::User,
            name: None,
            content: Content::Parts(vec![
                ContentPart::Text {
                    text: USER_PROMPT.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: image.to_data_uri() },
                },
            ]),
        },
    ];

    let mut req = CreateRequest::new(model.to_string(), messages);
    req.temperature = Some(parameters.temperature);
    req.top_p = Some(parameters.top_p);
    req.max_tokens = Some(parameters.max_tokens);
    req
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_input::sample_jpeg;

    fn assert_two_turns(req: &CreateRequest, image: &ImageInput) {
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[0].content, Content::Text(SYSTEM_PROMPT.to_string()));
        assert_eq!(req.messages[1].role, Role::User);
        assert_eq!(
            req.messages[1].content,
            Content::Parts(vec![
                ContentPart::Text {
                    text: USER_PROMPT.to_string()
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: image.to_data_uri() }
                },
            ])
        );
    }

    #[test]
    fn test_build_request_shape() {
        let image = ImageInput::from_bytes(sample_jpeg()).unwrap();
        let req = build_request(DEFAULT_MODEL, &Parameters::default(), &image);
        assert_two_turns(&req, &image);
        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.temperature, Some(0.2));
        assert_eq!(req.top_p, Some(1.0));
        assert_eq!(req.max_tokens, Some(100));
    }

    #[test]
    fn test_build_request_shape_independent_of_image_size() {
        for side in [1, 64, 512] {
            let mut buf = std::io::Cursor::new(Vec::new());
            image::DynamicImage::ImageRgb8(image::RgbImage::new(side, side))
                .write_to(&mut buf, image::ImageFormat::Png)
                .unwrap();
            let image = ImageInput::from_bytes(buf.into_inner()).unwrap();
            assert_two_turns(&build_request(DEFAULT_MODEL, &Parameters::default(), &image), &image);
        }
    }

    #[test]
    fn test_build_request_json() {
        let image = ImageInput::from_bytes(sample_jpeg()).unwrap();
        let json = serde_json::to_value(build_request(DEFAULT_MODEL, &Parameters::default(), &image)).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"][0]["type"], "text");
        assert_eq!(json["messages"][1]["content"][0]["text"], USER_PROMPT);
        assert_eq!(json["messages"][1]["content"][1]["type"], "image_url");
        assert!(json["messages"][1]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
        assert_eq!(json["max_tokens"], 100);
    }

    #[test]
    fn test_system_prompt_taxonomy() {
        for needle in ["Minor", "Moderate", "Severe", "Not Damaged", "scratches, dents, cracks, and broken parts"] {
            assert!(SYSTEM_PROMPT.contains(needle), "missing {:?}", needle);
        }
    }

    #[test]
    fn test_parameters_defaults() {
        let parameters: Parameters = toml::from_str("temperature = 0.5").unwrap();
        assert_eq!(
            parameters,
            Parameters {
                temperature: 0.5,
                ..Default::default()
            }
        );
        assert!(toml::from_str::<Parameters>("top_k = 3").is_err());
    }
}
