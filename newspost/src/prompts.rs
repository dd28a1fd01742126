//! Prompt templates for the three generation steps.

use common::PromptLanguage;

pub fn title(language: PromptLanguage, topic: &str, news: &str) -> String {
    match language {
        PromptLanguage::Ru => format!(
            "Придумай привлекательный заголовок для статьи на тему '{}', с учетом новостей:\n{}",
            topic, news
        ),
        PromptLanguage::En => format!(
            "Come up with an attractive headline for an article on '{}', taking into account these news items:\n{}",
            topic, news
        ),
    }
}

pub fn meta_description(language: PromptLanguage, title: &str) -> String {
    match language {
        PromptLanguage::Ru => format!("Напиши мета-описание для статьи с заголовком: '{}'.", title),
        PromptLanguage::En => format!("Write a meta-description for the article titled: '{}'.", title),
    }
}

pub fn body(language: PromptLanguage, topic: &str, news: &str) -> String {
    match language {
        PromptLanguage::Ru => format!(
            "Напиши подробную статью на тему '{}', опираясь на следующие новости:\n{}\n\
             Статья должна быть структурированной, содержательной, с подзаголовками и выводами. \
             Используй короткие абзацы.",
            topic, news
        ),
        PromptLanguage::En => format!(
            "Write a detailed article on '{}', drawing on the following news items:\n{}\n\
             The article should be well structured and informative, with subheadings and a conclusion. \
             Use short paragraphs.",
            topic, news
        ),
    }
}
