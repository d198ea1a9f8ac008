pub const CONTACT_ACK: &str = "Thanks for your message. We'll review it soon.";

const FAQ: [(&str, &str); 5] = [
    (
        "How is my next period predicted?",
        "bloom adds your average cycle length to the start date of your last period. \
         The predicted period then lasts for your typical period length.",
    ),
    (
        "Where is my data kept?",
        "Only on this computer: in a .bloom folder for the current project, or in your \
         user data directory. Nothing is ever sent anywhere.",
    ),
    (
        "Why didn't my reminder arrive?",
        "Reminders are only delivered while bloom is running and notifications are \
         enabled. Times that have already passed are skipped.",
    ),
    (
        "Can I edit or delete a single entry?",
        "No. New cycle entries supersede older ones, and each list can be cleared as a whole.",
    ),
    (
        "Is this medical advice?",
        "No. Predictions are simple estimates. Talk to a health professional about \
         anything that worries you.",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqItem {
    pub question: &'static str,
    pub answer: &'static str,
    pub open: bool,
}

/// Static questions whose answers expand and collapse independently.
#[derive(Debug, Clone)]
pub struct Accordion {
    items: Vec<FaqItem>,
}

impl Default for Accordion {
    fn default() -> Self {
        Accordion {
            items: FAQ
                .iter()
                .map(|&(question, answer)| FaqItem {
                    question,
                    answer,
                    open: false,
                })
                .collect(),
        }
    }
}

impl Accordion {
    pub fn items(&self) -> &[FaqItem] {
        &self.items
    }

    pub fn toggle(&mut self, idx: usize) {
        if let Some(item) = self.items.get_mut(idx) {
            item.open = !item.open;
        }
    }
}

/// Contact form that acknowledges every message and forwards none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn submit(&mut self) -> &'static str {
        *self = ContactForm::default();
        CONTACT_ACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_only_that_item() {
        let mut faq = Accordion::default();
        faq.toggle(1);
        assert!(faq.items()[1].open);
        assert!(!faq.items()[0].open);
        faq.toggle(1);
        assert!(!faq.items()[1].open);
        faq.toggle(99);
    }

    #[test]
    fn contact_always_acknowledges_and_resets() {
        let mut form = ContactForm {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            message: "hello".into(),
        };
        assert_eq!(form.submit(), CONTACT_ACK);
        assert_eq!(form, ContactForm::default());
    }
}
